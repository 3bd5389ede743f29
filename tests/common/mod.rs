//! Shared fixtures for the round-trip tests: a mock WebUI server and
//! helpers to build its pages and read back what the client sent.

#![allow(dead_code)]

use std::sync::Arc;
use webui_client::{NoLogin, Session, SessionConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const WEBUI_PATH: &str = "/ais/servlets/WebUIServlet";
pub const APP_CLASS: &str = "ais.gui.vs.es.VSES017App";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn session_for(server: &MockServer) -> Arc<Session> {
    let config = SessionConfig::new(server.address().to_string()).with_scheme("http");
    Arc::new(Session::new(config, NoLogin).expect("Failed to create session"))
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

pub fn bootstrap_page(app_id: i64) -> String {
    format!(
        r#"<html><head><title>AiS2</title></head><body onload='window.setTimeout("WebUI_init(\"{}\", \"ais\", \"ais/webui2\")", 1)'></body></html>"#,
        app_id
    )
}

pub fn script_page(script: &str) -> String {
    format!(
        r#"<html><head><script type="text/javascript">{}</script></head><body></body></html>"#,
        script
    )
}

pub fn open_dialog_call(name: &str, title: &str) -> String {
    format!(
        r#"dm().openMainDialog("{}","{}","body",0,0,0,0,0,0,true,false,true,false);"#,
        name, title
    )
}

pub async fn mount_bootstrap(server: &MockServer, app_id: i64) {
    Mock::given(method("GET"))
        .and(path(WEBUI_PATH))
        .and(query_param("appClassName", APP_CLASS))
        .respond_with(html(&bootstrap_page(app_id)))
        .mount(server)
        .await;
}

/// Queue one round-trip response; responses are served in mount order
pub async fn mount_round_trip(server: &MockServer, script: &str) {
    Mock::given(method("POST"))
        .and(path(WEBUI_PATH))
        .respond_with(html(&script_page(script)))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Form fields of a request body, in order
pub fn form_fields(request: &Request) -> Vec<(String, String)> {
    url::form_urlencoded::parse(&request.body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub fn form_field(request: &Request, name: &str) -> Option<String> {
    form_fields(request)
        .into_iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v)
}

/// `xml_spec` documents of every round trip, in the order they were sent
pub async fn sent_xml_specs(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .filter_map(|r| form_field(r, "xml_spec"))
        .collect()
}
