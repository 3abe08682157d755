//! End-to-end synthesis of representative application descriptions

use ftl_config::synthesis::{
    AUTHORIZER_ID, GATEWAY_ID, PLATFORM_AUDIENCE, PLATFORM_ISSUER, PUBLIC_ROUTE,
};
use ftl_config::SynthesisConfig;
use ftl_manifest::{Manifest, Route, Source};
use ftl_policy::{AccessMode, PolicyContext, PolicyGenerator};
use ftl_synth::synthesizer::{
    AUTH_ALLOWED_SUBJECTS, AUTH_JWT_AUDIENCE, AUTH_JWT_ISSUER, GATEWAY_COMPONENT_NAMES,
};
use ftl_synth::{load_description, Format, SynthError, Synthesizer, ValidationError};

fn synthesize(content: &str, format: Format) -> Result<Manifest, SynthError> {
    let config = SynthesisConfig::default();
    let app = load_description(content, format, &config)?;
    Ok(Synthesizer::new(config).synthesize(&app)?)
}

fn var<'a>(manifest: &'a Manifest, component: &str, name: &str) -> Option<&'a str> {
    manifest
        .component(component)
        .and_then(|c| c.variables.get(name))
        .map(String::as_str)
}

#[test]
fn minimal_public_app() {
    let input = r#"{"name": "demo", "components": [{"id": "echo", "source": "./echo.wasm"}]}"#;
    let Ok(manifest) = synthesize(input, Format::Json) else {
        assert!(false, "synthesis failed");
        return;
    };

    let ids: Vec<&str> = manifest.components.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["echo", GATEWAY_ID]);
    assert_eq!(var(&manifest, GATEWAY_ID, GATEWAY_COMPONENT_NAMES), Some("echo"));
    assert_eq!(manifest.public_components(), vec![GATEWAY_ID]);
    assert_eq!(
        manifest.route_for(GATEWAY_ID),
        Some(&Route::Path(PUBLIC_ROUTE.to_string()))
    );
    assert_eq!(manifest.route_for("echo"), Some(&Route::Private));
    assert!(manifest.component(AUTHORIZER_ID).is_none());
}

#[test]
fn private_app_puts_authorizer_in_front() {
    let input = r#"
name: my-app
version: "1.0.0"
access: private
components:
  - id: calculator
    source: ./calculator.wasm
    build: { command: "cargo build --release" }
"#;
    let Ok(manifest) = synthesize(input, Format::Yaml) else {
        assert!(false, "synthesis failed");
        return;
    };

    assert_eq!(manifest.components.len(), 3);
    assert_eq!(manifest.public_components(), vec![AUTHORIZER_ID]);
    assert_eq!(manifest.route_for(GATEWAY_ID), Some(&Route::Private));
    assert_eq!(manifest.route_for("calculator"), Some(&Route::Private));
    assert_eq!(var(&manifest, AUTHORIZER_ID, AUTH_JWT_ISSUER), Some(PLATFORM_ISSUER));
    assert_eq!(
        var(&manifest, AUTHORIZER_ID, AUTH_JWT_AUDIENCE),
        Some(PLATFORM_AUDIENCE)
    );
    assert!(manifest
        .component("calculator")
        .and_then(|c| c.build.as_ref())
        .is_some_and(|b| b.command == "cargo build --release"));
}

#[test]
fn org_app_lists_allowed_subjects() {
    let input = r#"
name: team-tools
access: org
allowedSubjects: [user_a, user_b]
components:
  - id: search
    source: acme/search:2.0.0
"#;
    let Ok(manifest) = synthesize(input, Format::Yaml) else {
        assert!(false, "synthesis failed");
        return;
    };

    assert_eq!(
        var(&manifest, AUTHORIZER_ID, AUTH_ALLOWED_SUBJECTS),
        Some("user_a,user_b")
    );
    assert!(matches!(
        manifest.component("search").map(|c| &c.source),
        Some(Source::Registry { registry, package, version })
            if registry == "ghcr.io" && package == "acme:search" && version == "2.0.0"
    ));
}

#[test]
fn custom_app_uses_supplied_issuer() {
    let input = r#"
package ftl

name: "partner-api"
access: "custom"
auth: {
	jwt_issuer:   "https://auth.partner.example"
	jwt_audience: "partner-tools"
}
components: [{id: "lookup", source: "./lookup.wasm"}]
"#;
    let Ok(manifest) = synthesize(input, Format::Cue) else {
        assert!(false, "synthesis failed");
        return;
    };
    assert_eq!(
        var(&manifest, AUTHORIZER_ID, AUTH_JWT_ISSUER),
        Some("https://auth.partner.example")
    );
    assert_eq!(
        var(&manifest, AUTHORIZER_ID, AUTH_JWT_AUDIENCE),
        Some("partner-tools")
    );
}

#[test]
fn custom_without_issuer_names_the_field() {
    let input = "name: demo\naccess: custom\nauth:\n  jwt_audience: demo-api\n";
    let result = synthesize(input, Format::Yaml);
    let Err(SynthError::Validation(errors)) = result else {
        assert!(false, "expected a validation error");
        return;
    };
    assert!(errors.errors().iter().any(|e| matches!(
        e,
        ValidationError::MissingCustomAuth { field } if field == "auth.jwt_issuer"
    )));
    assert!(errors.to_string().contains("auth.jwt_issuer"));
}

#[test]
fn capability_grants_are_never_forwarded() {
    let input = r#"
name: demo
components:
  - id: sneaky
    source: ./sneaky.wasm
    key_value_stores: [default]
    allowed_outbound_hosts: ["https://*"]
    sqlite_databases: [default]
    ai_models: [llama2-chat]
"#;
    let Ok(manifest) = synthesize(input, Format::Yaml) else {
        assert!(false, "synthesis failed");
        return;
    };
    let Some(sneaky) = manifest.component("sneaky") else {
        assert!(false, "component missing");
        return;
    };
    assert!(sneaky.key_value_stores.is_empty());
    assert!(sneaky.allowed_outbound_hosts.is_empty());

    let Ok(toml) = manifest.to_toml_string() else {
        assert!(false, "rendering failed");
        return;
    };
    assert!(!toml.contains("sqlite_databases"));
    assert!(!toml.contains("ai_models"));
    assert!(!toml.contains("https://*"));
}

#[test]
fn invalid_description_reports_every_problem() {
    let input = r#"
name: Demo
components:
  - id: echo
    source: ./echo.wasm
  - id: echo
    source: just-a-name
"#;
    let result = synthesize(input, Format::Yaml);
    let Err(SynthError::Validation(errors)) = result else {
        assert!(false, "expected validation errors");
        return;
    };
    assert!(errors.has_field("name"));
    assert!(errors.has_field("components[1].id"));
    assert!(errors.has_field("components[1].source"));
}

#[test]
fn malformed_input_is_a_parse_error() {
    let result = synthesize("name: [unterminated", Format::Yaml);
    assert!(matches!(result, Err(SynthError::Parse(_))));

    let result = synthesize("package ftl\nname: \"demo\"\nname: \"other\"\n", Format::Cue);
    assert!(matches!(result, Err(SynthError::Parse(_))));
}

#[test]
fn org_policy_matches_description() {
    let input = "name: team-tools\naccess: org\nrequired_claims:\n  role: admin\n";
    let config = SynthesisConfig::default();
    let Ok(app) = load_description(input, Format::Yaml, &config) else {
        assert!(false, "description failed to load");
        return;
    };
    let ctx = PolicyContext {
        org_id: Some("org_1".to_string()),
        org_members: vec!["user_a".to_string(), "user_b".to_string()],
        required_claims: app.required_claims.clone(),
        ..Default::default()
    };
    let result = PolicyGenerator::new().generate(app.access, &ctx);
    let Ok(Some(policy)) = result else {
        assert!(false, "expected an org policy");
        return;
    };
    assert_eq!(app.access, AccessMode::Org);
    assert_eq!(policy.data["org_id"], "org_1");
    assert_eq!(policy.data["members"], serde_json::json!(["user_a", "user_b"]));
    assert_eq!(policy.data["required_claims"]["role"], "admin");
}
