use serde_json::{json, Value};
use tracing::debug;

use crate::claims::{ClaimRequirements, DATA_KEY};
use crate::errors::PolicyError;
use crate::mode::AccessMode;

pub const POLICY_PACKAGE: &str = "mcp.authorization";

/// Boolean query the authorizer evaluates
pub const POLICY_QUERY: &str = "data.mcp.authorization.allow";

/// Inputs needed to build a policy for one deployment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyContext {
    pub owner_subject: Option<String>,
    pub org_id: Option<String>,
    pub org_members: Vec<String>,
    pub required_claims: ClaimRequirements,
}

/// A generated Rego module plus the data document it reads
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub source: String,
    pub data: Value,
}

impl Policy {
    pub fn data_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string(&self.data)?)
    }

    pub fn data_json_pretty(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyGenerator;

impl PolicyGenerator {
    pub fn new() -> Self {
        PolicyGenerator
    }

    /// Generate the policy for an access mode.
    ///
    /// `public` and `custom` yield `None`: the former needs no authorization
    /// and the latter is user-supplied.
    pub fn generate(
        &self,
        mode: AccessMode,
        ctx: &PolicyContext,
    ) -> Result<Option<Policy>, PolicyError> {
        debug!("Generating policy for mode: {}", mode);
        match mode {
            AccessMode::Public | AccessMode::Custom => Ok(None),
            AccessMode::Private => self.private_policy(ctx).map(Some),
            AccessMode::Org => self.org_policy(ctx).map(Some),
        }
    }

    /// Like [`generate`](Self::generate) but takes the mode as text
    pub fn generate_str(
        &self,
        mode: &str,
        ctx: &PolicyContext,
    ) -> Result<Option<Policy>, PolicyError> {
        self.generate(mode.parse()?, ctx)
    }

    fn private_policy(&self, ctx: &PolicyContext) -> Result<Policy, PolicyError> {
        let owner =
            non_empty(ctx.owner_subject.as_deref()).ok_or(PolicyError::MissingOwnerSubject)?;

        let claim_conditions = ctx.required_claims.compile();
        let mut source = header();
        source.push_str("# Only the owner may access this application\n");
        source.push_str(&rule(
            &["input.token.sub == data.owner".to_string()],
            &claim_conditions,
        ));

        let mut data = json!({ "owner": owner });
        bind_claims(&mut data, &ctx.required_claims);

        Ok(Policy { source, data })
    }

    fn org_policy(&self, ctx: &PolicyContext) -> Result<Policy, PolicyError> {
        let org_id = non_empty(ctx.org_id.as_deref()).ok_or(PolicyError::MissingOrgId)?;

        let claim_conditions = ctx.required_claims.compile();
        let mut source = header();
        source.push_str("# User tokens: subject must be a listed member\n");
        source.push_str(&rule(
            &[
                "not input.token.claims.org_id".to_string(),
                "input.token.sub == data.members[_]".to_string(),
            ],
            &claim_conditions,
        ));
        source.push('\n');
        source.push_str("# Machine tokens: org claim must match\n");
        source.push_str(&rule(
            &["input.token.claims.org_id == data.org_id".to_string()],
            &claim_conditions,
        ));

        let mut data = json!({
            "org_id": org_id,
            "members": ctx.org_members,
        });
        bind_claims(&mut data, &ctx.required_claims);

        Ok(Policy { source, data })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn header() -> String {
    format!(
        "package {}\n\nimport rego.v1\n\ndefault allow := false\n\n",
        POLICY_PACKAGE
    )
}

fn rule(conditions: &[String], claim_conditions: &[String]) -> String {
    let mut out = String::from("allow if {\n");
    for condition in conditions.iter().chain(claim_conditions) {
        out.push('\t');
        out.push_str(condition);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

fn bind_claims(data: &mut Value, claims: &ClaimRequirements) {
    if claims.is_empty() {
        return;
    }
    if let Value::Object(map) = data {
        map.insert(DATA_KEY.to_string(), claims.to_value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_ctx() -> PolicyContext {
        PolicyContext {
            owner_subject: Some("user_123".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_public_and_custom_have_no_policy() {
        let generator = PolicyGenerator::new();
        let ctx = PolicyContext::default();
        assert!(generator
            .generate(AccessMode::Public, &ctx)
            .is_ok_and(|p| p.is_none()));
        assert!(generator
            .generate(AccessMode::Custom, &ctx)
            .is_ok_and(|p| p.is_none()));
    }

    #[test]
    fn test_private_policy() {
        let result = PolicyGenerator::new().generate(AccessMode::Private, &owner_ctx());
        let Ok(Some(policy)) = result else {
            assert!(false, "expected a policy");
            return;
        };
        assert!(policy.source.starts_with("package mcp.authorization"));
        assert!(policy.source.contains("default allow := false"));
        assert!(policy.source.contains("input.token.sub == data.owner"));
        assert_eq!(policy.data, json!({"owner": "user_123"}));
    }

    #[test]
    fn test_private_requires_owner() {
        let result =
            PolicyGenerator::new().generate(AccessMode::Private, &PolicyContext::default());
        assert!(matches!(result, Err(PolicyError::MissingOwnerSubject)));

        let blank = PolicyContext {
            owner_subject: Some("  ".to_string()),
            ..Default::default()
        };
        let result = PolicyGenerator::new().generate(AccessMode::Private, &blank);
        assert!(matches!(result, Err(PolicyError::MissingOwnerSubject)));
    }

    #[test]
    fn test_org_requires_org_id() {
        let result = PolicyGenerator::new().generate(AccessMode::Org, &PolicyContext::default());
        assert!(matches!(result, Err(PolicyError::MissingOrgId)));
    }

    #[test]
    fn test_org_without_members_has_empty_list() {
        let ctx = PolicyContext {
            org_id: Some("org_1".to_string()),
            ..Default::default()
        };
        let result = PolicyGenerator::new().generate(AccessMode::Org, &ctx);
        let Ok(Some(policy)) = result else {
            assert!(false, "expected a policy");
            return;
        };
        assert_eq!(policy.data, json!({"org_id": "org_1", "members": []}));
        assert!(policy.source.contains("not input.token.claims.org_id"));
        assert!(policy
            .source
            .contains("input.token.claims.org_id == data.org_id"));
    }

    #[test]
    fn test_required_claims_bound_under_distinct_key() {
        let mut ctx = owner_ctx();
        ctx.required_claims.insert("role", json!("admin"));

        let result = PolicyGenerator::new().generate(AccessMode::Private, &ctx);
        let Ok(Some(policy)) = result else {
            assert!(false, "expected a policy");
            return;
        };
        assert_eq!(policy.data["required_claims"], json!({"role": "admin"}));
        assert!(policy
            .source
            .contains(r#"input.token.claims["role"] == data.required_claims["role"]"#));
    }

    #[test]
    fn test_claim_conditions_added_to_every_org_rule() {
        let mut ctx = PolicyContext {
            org_id: Some("org_1".to_string()),
            ..Default::default()
        };
        ctx.required_claims.insert("tier", json!("gold"));

        let result = PolicyGenerator::new().generate(AccessMode::Org, &ctx);
        assert!(result.is_ok_and(|p| p.is_some_and(|p| p
            .source
            .matches(r#"input.token.claims["tier"]"#)
            .count()
            == 2)));
    }

    #[test]
    fn test_generate_str_unknown_mode() {
        let result = PolicyGenerator::new().generate_str("invalid", &owner_ctx());
        assert!(matches!(result, Err(PolicyError::UnknownMode(m)) if m == "invalid"));
    }

    #[test]
    fn test_data_json() {
        let result = PolicyGenerator::new().generate(AccessMode::Private, &owner_ctx());
        assert!(result.is_ok_and(|p| p
            .and_then(|p| p.data_json().ok())
            .is_some_and(|s| s == r#"{"owner":"user_123"}"#)));
    }
}
