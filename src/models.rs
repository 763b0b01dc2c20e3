use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SoftoneError, SoftoneResult};

/// The 4-tuple scoping a session to a tenant/workspace.
///
/// Field values are opaque to the client: the gateway hands them out in the
/// bare-login `objs` list and expects them echoed back verbatim (they are
/// numeric in practice, but nothing here depends on that).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TenantContext {
    #[serde(rename = "COMPANY")]
    pub company: Value,
    #[serde(rename = "BRANCH")]
    pub branch: Value,
    #[serde(rename = "MODULE")]
    pub module: Value,
    #[serde(rename = "REFID")]
    pub ref_id: Value,
}

impl TenantContext {
    /// Resolve a tenant context for the auto-login chain: each field comes
    /// from client configuration when present, otherwise from the tenant
    /// object at `index` in the bare-login `objs` array.
    pub(crate) fn resolve(
        configured: &PartialTenant,
        objs: Option<&Vec<Value>>,
        index: usize,
    ) -> SoftoneResult<Self> {
        let fallback = |key: &str| -> SoftoneResult<Value> {
            let obj = objs.and_then(|list| list.get(index)).ok_or_else(|| {
                SoftoneError::session(format!(
                    "login response has no tenant object at index {index}"
                ))
            })?;
            Ok(obj[key].clone())
        };

        Ok(Self {
            company: match &configured.company {
                Some(value) => value.clone(),
                None => fallback("COMPANY")?,
            },
            branch: match &configured.branch {
                Some(value) => value.clone(),
                None => fallback("BRANCH")?,
            },
            module: match &configured.module {
                Some(value) => value.clone(),
                None => fallback("MODULE")?,
            },
            ref_id: match &configured.ref_id {
                Some(value) => value.clone(),
                None => fallback("REFID")?,
            },
        })
    }
}

/// Tenant-context fields as configured on the client, each optional.
#[derive(Debug, Clone, Default)]
pub(crate) struct PartialTenant {
    pub company: Option<Value>,
    pub branch: Option<Value>,
    pub module: Option<Value>,
    pub ref_id: Option<Value>,
}

impl PartialTenant {
    pub fn is_complete(&self) -> bool {
        self.company.is_some()
            && self.branch.is_some()
            && self.module.is_some()
            && self.ref_id.is_some()
    }
}
