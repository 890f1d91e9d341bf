//! Full fetch → collect → normalize → submit flow for both gateway variants

use contact_relay::render::collect_values;
use contact_relay::{
    build_router, ConfigArgs, DirectGateway, FormShell, FormsGateway, HubSpotClient, RelayClient, RelayConfig,
    RelayState, ShellState, SUBMISSION_FAILED,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORM_ID: &str = "contact-form";

fn config(upstream: &MockServer) -> RelayConfig {
    RelayConfig::try_from(ConfigArgs {
        api_token: Some("pat-123".into()),
        portal_id: Some("123456".into()),
        form_id: Some(FORM_ID.into()),
        port: 0,
        allowed_origin: "http://localhost:3000".into(),
        forms_api_url: format!("{}/marketing/v3/forms", upstream.uri()),
        submit_api_url: format!("{}/submissions/v3/integration/submit", upstream.uri()),
        timeout_secs: 5,
    })
    .unwrap()
}

async fn mount_schema(upstream: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/marketing/v3/forms/{FORM_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fieldGroups": [{
                "fields": [
                    { "name": "email", "label": "Email", "fieldType": "email", "required": true },
                    {
                        "name": "interests", "label": "Interests", "fieldType": "multiple_checkboxes",
                        "options": [{ "label": "Pricing", "value": "pricing" }, { "label": "Support", "value": "support" }]
                    },
                    {
                        "name": "country", "label": "Country", "fieldType": "dropdown",
                        "options": [{ "label": "Germany", "value": "DE" }]
                    }
                ]
            }],
            "displayOptions": { "submitButtonText": "Send" }
        })))
        .mount(upstream)
        .await;
}

fn expected_submission() -> serde_json::Value {
    json!({
        "fields": [
            { "name": "email", "value": "jane@example.com" },
            { "name": "interests", "value": "pricing; support" },
            { "name": "country", "value": "Germany" }
        ]
    })
}

fn answers() -> Vec<(String, String)> {
    vec![
        ("email".into(), "jane@example.com".into()),
        ("interests".into(), "pricing,support".into()),
        ("country".into(), "DE".into()),
    ]
}

async fn run_flow<G: FormsGateway>(shell: &mut FormShell<G>) -> ShellState {
    let definition = shell.load().await.unwrap();
    assert_eq!(definition.submit_button_text, "Send");

    let raw = collect_values(definition, &answers()).unwrap();
    shell.submit(&raw).await.unwrap().clone()
}

/// Serve the relay on an ephemeral port
async fn spawn_relay(config: RelayConfig) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(RelayState::new(config).unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_direct_gateway_flow() {
    let upstream = MockServer::start().await;
    mount_schema(&upstream).await;
    Mock::given(method("POST"))
        .and(path(format!("/submissions/v3/integration/submit/123456/{FORM_ID}")))
        .and(body_json(expected_submission()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "inlineMessage": "Thanks" })))
        .expect(1)
        .mount(&upstream)
        .await;

    let config = config(&upstream);
    let gateway = DirectGateway::new(HubSpotClient::from_config(&config).unwrap(), &config);
    let mut shell = FormShell::new(gateway, config.form_id.clone());

    assert_eq!(run_flow(&mut shell).await, ShellState::Submitted);
}

#[tokio::test]
async fn test_relay_client_flow() {
    let upstream = MockServer::start().await;
    mount_schema(&upstream).await;
    Mock::given(method("POST"))
        .and(path(format!("/submissions/v3/integration/submit/123456/{FORM_ID}")))
        .and(body_json(expected_submission()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "inlineMessage": "Thanks" })))
        .expect(1)
        .mount(&upstream)
        .await;

    let relay_url = spawn_relay(config(&upstream)).await;
    let mut shell = FormShell::new(RelayClient::new(&relay_url), FORM_ID);

    assert_eq!(run_flow(&mut shell).await, ShellState::Submitted);
}

#[tokio::test]
async fn test_relay_client_surfaces_upstream_rejection() {
    let upstream = MockServer::start().await;
    mount_schema(&upstream).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid email address" })))
        .mount(&upstream)
        .await;

    let relay_url = spawn_relay(config(&upstream)).await;
    let mut shell = FormShell::new(RelayClient::new(&relay_url), FORM_ID);

    assert_eq!(
        run_flow(&mut shell).await,
        ShellState::SubmitError {
            message: "Invalid email address".into()
        }
    );
    assert!(!shell.is_submitted());
}

#[tokio::test]
async fn test_unexplained_rejection_reads_the_same_through_both_gateways() {
    let upstream = MockServer::start().await;
    mount_schema(&upstream).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&upstream)
        .await;

    let config = config(&upstream);
    let direct = DirectGateway::new(HubSpotClient::from_config(&config).unwrap(), &config);
    let mut direct = FormShell::new(direct, FORM_ID);

    let relay_url = spawn_relay(config).await;
    let mut relayed = FormShell::new(RelayClient::new(&relay_url), FORM_ID);

    let expected = ShellState::SubmitError {
        message: SUBMISSION_FAILED.into(),
    };
    assert_eq!(run_flow(&mut direct).await, expected);
    assert_eq!(run_flow(&mut relayed).await, expected);
}

#[tokio::test]
async fn test_schema_failure_still_renders_empty_form() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;

    let relay_url = spawn_relay(config(&upstream)).await;
    let mut shell = FormShell::new(RelayClient::new(&relay_url), FORM_ID);

    let definition = shell.load().await.unwrap();
    assert!(definition.is_empty());
    assert_eq!(definition.submit_button_text, "");
    assert_eq!(shell.state(), &ShellState::Ready);
}
