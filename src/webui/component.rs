//! Component tree
//!
//! Mirrors the server-rendered component tree of one dialog. Components are
//! recognised in the markup by their type attribute (`jsct`) and named by
//! `id`; markup without a type attribute is structural and is walked through.
//!
//! Nodes live in an arena owned by [`ComponentTree`] and refer to each other
//! by [`ComponentId`]. Every container keeps its direct children in document
//! order plus a flattened name index over its whole subtree.

use crate::error::{Result, WebUiError};
use crate::markup::leading_text;
use scraper::ElementRef;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Attribute carrying the component type discriminator
pub const TYPE_ATTR: &str = "jsct";
/// Attribute carrying the component name
pub const NAME_ATTR: &str = "id";
const READONLY_ATTR: &str = "_readonly";

// =============================================================================
// COMPONENT TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Body,
    PopupMenu,
    Panel,
    TabbedPane,
    MenuItem,
    Button,
    Table,
    Separator,
    TextField,
    Action,
    ValueInteractive,
    Label,
    /// Discriminator outside the known vocabulary
    Other(String),
}

impl ComponentType {
    pub fn from_discriminator(discriminator: &str) -> Self {
        match discriminator {
            "body" => Self::Body,
            "popupMenu" => Self::PopupMenu,
            "panel" => Self::Panel,
            "tabbedPane" => Self::TabbedPane,
            "menuItem" => Self::MenuItem,
            "button" => Self::Button,
            "table" => Self::Table,
            "separator" => Self::Separator,
            "textField" => Self::TextField,
            "action" => Self::Action,
            "valueInteractive" => Self::ValueInteractive,
            "label" => Self::Label,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Body => "body",
            Self::PopupMenu => "popupMenu",
            Self::Panel => "panel",
            Self::TabbedPane => "tabbedPane",
            Self::MenuItem => "menuItem",
            Self::Button => "button",
            Self::Table => "table",
            Self::Separator => "separator",
            Self::TextField => "textField",
            Self::Action => "action",
            Self::ValueInteractive => "valueInteractive",
            Self::Label => "label",
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// NODES
// =============================================================================

/// Index of a component inside its [`ComponentTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owner of a component: the dialog itself, or a container inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Dialog,
    Component(ComponentId),
}

/// Children and flattened name index of a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    children: Vec<ComponentId>,
    by_name: HashMap<String, ComponentId>,
}

impl Container {
    /// Direct children in document order
    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    /// Name index over the whole subtree
    pub fn names(&self) -> &HashMap<String, ComponentId> {
        &self.by_name
    }

    pub fn lookup(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a freshly built child. A nested container's index is merged
    /// first and the child itself last; on a name clash the later entry wins.
    fn adopt(&mut self, child: &Component) {
        if let ComponentKind::Container(nested) = &child.kind {
            for (name, id) in &nested.by_name {
                self.by_name.insert(name.clone(), *id);
            }
        }
        self.by_name.insert(child.name.clone(), child.id);
        self.children.push(child.id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    Generic,
    Label {
        value: String,
        /// Name of the component this label describes
        name_for: Option<String>,
    },
    TextField {
        value: String,
        readonly: bool,
    },
    Container(Container),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    id: ComponentId,
    parent: Parent,
    name: String,
    component_type: ComponentType,
    kind: ComponentKind,
}

impl Component {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn as_container(&self) -> Option<&Container> {
        match &self.kind {
            ComponentKind::Container(container) => Some(container),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.as_container().is_some()
    }

    /// Display value of labels and text fields
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            ComponentKind::Label { value, .. } | ComponentKind::TextField { value, .. } => {
                Some(value)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ComponentKind::Container(_) => {
                write!(f, "container {} {}", self.component_type, self.name)
            }
            ComponentKind::Generic => write!(f, "component {} {}", self.component_type, self.name),
            ComponentKind::Label { value, name_for } => {
                write!(f, "component {} {} '{}'", self.component_type, self.name, value)?;
                match name_for {
                    Some(target) if !target.is_empty() => write!(f, " for={}", target),
                    _ => Ok(()),
                }
            }
            ComponentKind::TextField { value, readonly } => {
                write!(f, "component {} {} '{}'", self.component_type, self.name, value)?;
                if *readonly {
                    f.write_str(" readonly")?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Builds the variant data of one component from its element. A builder
/// that returns a container has its children collected by the tree walk.
pub type ComponentBuilder = fn(ElementRef<'_>) -> Result<ComponentKind>;

static BUILTIN_REGISTRY: LazyLock<ComponentRegistry> = LazyLock::new(ComponentRegistry::default);

/// Maps type discriminators to builders; unknown discriminators build containers
#[derive(Clone)]
pub struct ComponentRegistry {
    builders: HashMap<String, ComponentBuilder>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.builders.keys().collect();
        keys.sort();
        f.debug_struct("ComponentRegistry").field("types", &keys).finish()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for container in ["popupMenu", "panel", "tabbedPane"] {
            registry.register(container, build_container);
        }
        for generic in ["menuItem", "button", "table", "separator", "action", "valueInteractive"] {
            registry.register(generic, build_generic);
        }
        registry.register("textField", build_text_field);
        registry.register("label", build_label);
        registry
    }
}

impl ComponentRegistry {
    /// Registry where every discriminator builds a container
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// The built-in table, shared process-wide
    pub fn builtin() -> &'static ComponentRegistry {
        &BUILTIN_REGISTRY
    }

    pub fn register(&mut self, discriminator: impl Into<String>, builder: ComponentBuilder) {
        self.builders.insert(discriminator.into(), builder);
    }

    pub fn builder_for(&self, discriminator: &str) -> ComponentBuilder {
        self.builders
            .get(discriminator)
            .copied()
            .unwrap_or(build_container)
    }
}

pub fn build_generic(_: ElementRef<'_>) -> Result<ComponentKind> {
    Ok(ComponentKind::Generic)
}

pub fn build_label(element: ElementRef<'_>) -> Result<ComponentKind> {
    Ok(ComponentKind::Label {
        value: leading_text(&element),
        name_for: element.value().attr("for").map(str::to_string),
    })
}

pub fn build_text_field(element: ElementRef<'_>) -> Result<ComponentKind> {
    Ok(ComponentKind::TextField {
        value: element.value().attr("value").unwrap_or_default().to_string(),
        readonly: element.value().attr(READONLY_ATTR) == Some("true"),
    })
}

pub fn build_container(_: ElementRef<'_>) -> Result<ComponentKind> {
    Ok(ComponentKind::Container(Container::default()))
}

// =============================================================================
// TREE
// =============================================================================

/// Deepest nesting of containers accepted in one dialog
pub const MAX_CONTAINER_DEPTH: usize = 256;

/// A container whose children are still being walked
struct Frame<'a> {
    owner: Parent,
    container: Container,
    // next element on top
    pending: Vec<ElementRef<'a>>,
}

impl<'a> Frame<'a> {
    fn new(owner: Parent, element: ElementRef<'a>) -> Self {
        let mut frame = Self {
            owner,
            container: Container::default(),
            pending: Vec::new(),
        };
        frame.push_children(element);
        frame
    }

    fn push_children(&mut self, element: ElementRef<'a>) {
        let start = self.pending.len();
        self.pending.extend(element.children().filter_map(ElementRef::wrap));
        self.pending[start..].reverse();
    }
}

/// Depth-first walk over parsed markup with an explicit work stack
struct TreeBuilder<'r> {
    registry: &'r ComponentRegistry,
    nodes: Vec<Component>,
}

impl<'r> TreeBuilder<'r> {
    fn new(registry: &'r ComponentRegistry) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
        }
    }

    /// Walk every element below `root` in document order. A container is
    /// adopted by its owner only once its own subtree is complete, so its
    /// entry lands in the owner's index after the entries it merges.
    fn build(&mut self, root: ElementRef<'_>) -> Result<Container> {
        let mut root = Frame::new(Parent::Dialog, root);
        let mut open: Vec<Frame<'_>> = Vec::new();

        loop {
            let frame = open.last_mut().unwrap_or(&mut root);
            if let Some(element) = frame.pending.pop() {
                match element.value().attr(TYPE_ATTR) {
                    None => frame.push_children(element),
                    Some(discriminator) => {
                        let id = self.instantiate(frame.owner, element, discriminator)?;
                        if self.nodes[id.0].is_container() {
                            if open.len() >= MAX_CONTAINER_DEPTH {
                                return Err(WebUiError::protocol(format!(
                                    "containers nested deeper than {} levels at {:?}",
                                    MAX_CONTAINER_DEPTH, self.nodes[id.0].name
                                )));
                            }
                            open.push(Frame::new(Parent::Component(id), element));
                        } else {
                            frame.container.adopt(&self.nodes[id.0]);
                        }
                    }
                }
                continue;
            }

            let Some(done) = open.pop() else { break };
            if let Parent::Component(id) = done.owner {
                self.nodes[id.0].kind = ComponentKind::Container(done.container);
                let owner = open.last_mut().unwrap_or(&mut root);
                owner.container.adopt(&self.nodes[id.0]);
            }
        }

        Ok(root.container)
    }

    fn instantiate(&mut self, parent: Parent, element: ElementRef<'_>, discriminator: &str) -> Result<ComponentId> {
        let name = element.value().attr(NAME_ATTR).ok_or_else(|| {
            WebUiError::protocol(format!("component of type {:?} has no id", discriminator))
        })?;

        let build = self.registry.builder_for(discriminator);
        let kind = build(element)?;

        let id = ComponentId(self.nodes.len());
        self.nodes.push(Component {
            id,
            parent,
            name: name.to_string(),
            component_type: ComponentType::from_discriminator(discriminator),
            kind,
        });
        Ok(id)
    }
}

/// Components of one dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentTree {
    nodes: Vec<Component>,
    root: Container,
}

impl ComponentTree {
    /// Build the tree below `root`; the root element itself is not a component
    pub fn build(root: ElementRef<'_>, registry: &ComponentRegistry) -> Result<Self> {
        let mut builder = TreeBuilder::new(registry);
        let root_container = builder.build(root)?;
        Ok(Self {
            nodes: builder.nodes,
            root: root_container,
        })
    }

    /// Top-level children and the name index of the whole tree
    pub fn root(&self) -> &Container {
        &self.root
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.nodes.get(id.0)
    }

    pub fn by_name(&self, name: &str) -> Option<&Component> {
        self.root.lookup(name).and_then(|id| self.get(id))
    }

    /// Direct children of the dialog
    pub fn children(&self) -> impl Iterator<Item = &Component> {
        self.root.children.iter().filter_map(|id| self.get(*id))
    }

    /// Direct children of a container; empty for leaf components
    pub fn children_of(&self, id: ComponentId) -> impl Iterator<Item = &Component> {
        self.get(id)
            .and_then(Component::as_container)
            .map(|c| c.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.get(*child))
    }

    /// All components, in construction order
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Owners of `id`, nearest first, ending below the dialog
    pub fn ancestors(&self, id: ComponentId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).map(Component::parent),
        }
    }

    /// Indented listing of the tree, `<no children>` under empty containers
    pub fn outline(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<(ComponentId, usize)> = self.root.children.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let Some(component) = self.get(id) else { continue };
            out.push_str(&"  ".repeat(depth));
            out.push_str(&component.to_string());
            out.push('\n');
            if let Some(container) = component.as_container() {
                if container.is_empty() {
                    out.push_str(&"  ".repeat(depth + 1));
                    out.push_str("<no children>\n");
                }
                stack.extend(container.children.iter().rev().map(|child| (*child, depth + 1)));
            }
        }
        out
    }
}

pub struct Ancestors<'t> {
    tree: &'t ComponentTree,
    next: Option<Parent>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = &'t Component;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next.take()? {
            Parent::Dialog => None,
            Parent::Component(id) => {
                let component = self.tree.get(id)?;
                self.next = Some(component.parent);
                Some(component)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{parse_html, select_first};

    fn build(markup: &str) -> ComponentTree {
        let html = parse_html(markup);
        let body = select_first(&html, "[jsct=body]").unwrap();
        ComponentTree::build(body, ComponentRegistry::builtin()).unwrap()
    }

    #[test]
    fn test_nested_containers_are_flattened() {
        let tree = build(
            r#"<div jsct="body" id="F1">
                 <div jsct="panel" id="A">
                   <span jsct="button" id="B"></span>
                   <div jsct="panel" id="C">
                     <input jsct="textField" id="D" value="x">
                   </div>
                 </div>
               </div>"#,
        );

        let mut names: Vec<_> = tree.root().names().keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["A", "B", "C", "D"]);

        let top: Vec<_> = tree.children().map(Component::name).collect();
        assert_eq!(top, vec!["A"]);

        let a = tree.by_name("A").unwrap();
        let direct: Vec<_> = tree.children_of(a.id()).map(Component::name).collect();
        assert_eq!(direct, vec!["B", "C"]);
        assert!(a.as_container().unwrap().lookup("D").is_some());
    }

    #[test]
    fn test_structural_markup_is_skipped() {
        let tree = build(
            r#"<div jsct="body" id="F1">
                 <table><tr><td><div><span jsct="label" id="L1" for="T1">Meno</span></div></td>
                 <td><input jsct="textField" id="T1" value="Ján" _readonly="true"></td></tr></table>
               </div>"#,
        );

        let top: Vec<_> = tree.children().map(Component::name).collect();
        assert_eq!(top, vec!["L1", "T1"]);

        let label = tree.by_name("L1").unwrap();
        assert_eq!(
            label.kind(),
            &ComponentKind::Label {
                value: "Meno".to_string(),
                name_for: Some("T1".to_string()),
            }
        );
        assert_eq!(label.to_string(), "component label L1 'Meno' for=T1");

        let field = tree.by_name("T1").unwrap();
        assert_eq!(field.value(), Some("Ján"));
        assert_eq!(field.to_string(), "component textField T1 'Ján' readonly");
    }

    #[test]
    fn test_variant_defaults() {
        let tree = build(
            r#"<div jsct="body" id="F1">
                 <span jsct="label" id="L"></span>
                 <input jsct="textField" id="T" _readonly="yes">
               </div>"#,
        );
        assert_eq!(
            tree.by_name("L").unwrap().kind(),
            &ComponentKind::Label {
                value: String::new(),
                name_for: None,
            }
        );
        assert_eq!(
            tree.by_name("T").unwrap().kind(),
            &ComponentKind::TextField {
                value: String::new(),
                readonly: false,
            }
        );
    }

    #[test]
    fn test_unknown_discriminator_becomes_container() {
        let tree = build(
            r#"<div jsct="body" id="F1">
                 <div jsct="splitPane" id="S"><span jsct="button" id="OK"></span></div>
               </div>"#,
        );
        let split = tree.by_name("S").unwrap();
        assert!(split.is_container());
        assert_eq!(split.component_type(), &ComponentType::Other("splitPane".to_string()));
        assert_eq!(split.to_string(), "container splitPane S");
        assert!(tree.by_name("OK").is_some());
    }

    #[test]
    fn test_duplicate_names_last_write_wins() {
        let tree = build(
            r#"<div jsct="body" id="F1">
                 <div jsct="panel" id="P1"><span jsct="button" id="dup"></span></div>
                 <div jsct="panel" id="P2"><span jsct="label" id="dup">later</span></div>
               </div>"#,
        );
        let dup = tree.by_name("dup").unwrap();
        assert_eq!(dup.component_type(), &ComponentType::Label);
        assert_eq!(dup.value(), Some("later"));
        // both nodes still exist in the tree itself
        assert_eq!(tree.iter().filter(|c| c.name() == "dup").count(), 2);
    }

    #[test]
    fn test_container_wins_over_its_own_descendant() {
        let tree = build(
            r#"<div jsct="body" id="F1">
                 <div jsct="panel" id="X"><span jsct="button" id="X"></span></div>
               </div>"#,
        );
        assert!(tree.by_name("X").unwrap().is_container());
    }

    #[test]
    fn test_ancestors_stop_at_dialog() {
        let tree = build(
            r#"<div jsct="body" id="F1">
                 <div jsct="tabbedPane" id="tabs"><div jsct="panel" id="p"><span jsct="button" id="b"></span></div></div>
               </div>"#,
        );
        let button = tree.by_name("b").unwrap();
        let chain: Vec<_> = tree.ancestors(button.id()).map(Component::name).collect();
        assert_eq!(chain, vec!["p", "tabs"]);
        let tabs = tree.by_name("tabs").unwrap();
        assert_eq!(tabs.parent(), Parent::Dialog);
        assert_eq!(tree.ancestors(tabs.id()).count(), 0);
    }

    #[test]
    fn test_missing_id_is_protocol_error() {
        let html = parse_html(r#"<div jsct="body" id="F1"><span jsct="button"></span></div>"#);
        let body = select_first(&html, "[jsct=body]").unwrap();
        let err = ComponentTree::build(body, ComponentRegistry::builtin()).unwrap_err();
        assert!(matches!(err, WebUiError::ProtocolFormat(_)));
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = ComponentRegistry::empty();
        registry.register("button", build_generic);
        let html = parse_html(
            r#"<div jsct="body" id="F1"><span jsct="label" id="L">text</span><span jsct="button" id="B"></span></div>"#,
        );
        let body = select_first(&html, "[jsct=body]").unwrap();
        let tree = ComponentTree::build(body, &registry).unwrap();
        assert!(tree.by_name("L").unwrap().is_container());
        assert_eq!(tree.by_name("B").unwrap().kind(), &ComponentKind::Generic);
    }

    fn nested(depth: usize, open: &str, close: &str, leaf: &str) -> String {
        let mut markup = String::from(r#"<div jsct="body" id="F1">"#);
        for level in 0..depth {
            markup.push_str(&open.replace("{}", &level.to_string()));
        }
        markup.push_str(leaf);
        for _ in 0..depth {
            markup.push_str(close);
        }
        markup.push_str("</div>");
        markup
    }

    #[test]
    fn test_deep_container_nesting_is_protocol_error() {
        let markup = nested(20_000, r#"<div jsct="panel" id="p{}">"#, "</div>", "");
        let html = parse_html(&markup);
        let body = select_first(&html, "[jsct=body]").unwrap();
        let err = ComponentTree::build(body, ComponentRegistry::builtin()).unwrap_err();
        assert!(matches!(err, WebUiError::ProtocolFormat(_)));
    }

    #[test]
    fn test_deep_structural_markup_is_walked() {
        let tree = build(&nested(20_000, "<div>", "</div>", r#"<span jsct="button" id="ok"></span>"#));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.by_name("ok").unwrap().parent(), Parent::Dialog);
    }

    #[test]
    fn test_nesting_up_to_the_limit_is_indexed() {
        let tree = build(&nested(
            MAX_CONTAINER_DEPTH,
            r#"<div jsct="panel" id="p{}">"#,
            "</div>",
            r#"<span jsct="button" id="leaf"></span>"#,
        ));
        assert_eq!(tree.len(), MAX_CONTAINER_DEPTH + 1);
        assert_eq!(tree.root().names().len(), MAX_CONTAINER_DEPTH + 1);
        let leaf = tree.by_name("leaf").unwrap();
        assert_eq!(tree.ancestors(leaf.id()).count(), MAX_CONTAINER_DEPTH);
        assert_eq!(tree.outline().lines().count(), MAX_CONTAINER_DEPTH + 1);
    }

    #[test]
    fn test_outline() {
        let tree = build(
            r#"<div jsct="body" id="F1">
                 <div jsct="panel" id="empty"></div>
                 <div jsct="panel" id="full"><span jsct="button" id="b"></span></div>
               </div>"#,
        );
        assert_eq!(
            tree.outline(),
            "container panel empty\n  <no children>\ncontainer panel full\n  component button b\n"
        );
    }
}
