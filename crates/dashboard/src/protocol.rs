//! Protocol (`protocolo`): an operational guideline card shown on the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use v4vision_core::{CompanyId, DomainResult, RecordId, TenantRecord};

use crate::record::{DashboardRecord, optional_text, required_text, tenant_owned};

const TITLE_MAX: usize = 100;
const ICON_MAX: usize = 50;
const COLOR_MAX: usize = 20;
pub const DEFAULT_COLOR: &str = "orange";

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    Sla,
    Foco,
    Feedback,
    Outro,
}

impl ProtocolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolKind::Sla => "sla",
            ProtocolKind::Foco => "foco",
            ProtocolKind::Feedback => "feedback",
            ProtocolKind::Outro => "outro",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProtocolKind::Sla => "SLA",
            ProtocolKind::Foco => "Foco",
            ProtocolKind::Feedback => "Feedback",
            ProtocolKind::Outro => "Outro",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub id: RecordId,
    #[serde(rename = "company")]
    pub company_id: CompanyId,
    #[serde(rename = "tipo")]
    pub kind: ProtocolKind,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao")]
    pub description: String,
    /// Icon name, empty when unset.
    #[serde(rename = "icone")]
    pub icon: String,
    #[serde(rename = "cor")]
    pub color: String,
    /// Display position; lower comes first.
    #[serde(rename = "ordem")]
    pub position: u16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolInput {
    #[serde(rename = "tipo")]
    pub kind: ProtocolKind,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "icone", default)]
    pub icon: String,
    #[serde(rename = "cor", default = "default_color")]
    pub color: String,
    #[serde(rename = "ordem", default)]
    pub position: u16,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtocolPatch {
    #[serde(rename = "tipo")]
    pub kind: Option<ProtocolKind>,
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "icone")]
    pub icon: Option<String>,
    #[serde(rename = "cor")]
    pub color: Option<String>,
    #[serde(rename = "ordem")]
    pub position: Option<u16>,
}

impl From<ProtocolInput> for ProtocolPatch {
    fn from(value: ProtocolInput) -> Self {
        Self {
            kind: Some(value.kind),
            title: Some(value.title),
            description: Some(value.description),
            icon: Some(value.icon),
            color: Some(value.color),
            position: Some(value.position),
        }
    }
}

fn title(value: &str) -> DomainResult<String> {
    required_text("titulo", value, Some(TITLE_MAX))
}

fn description(value: &str) -> DomainResult<String> {
    required_text("descricao", value, None)
}

fn icon(value: &str) -> DomainResult<String> {
    optional_text("icone", value, Some(ICON_MAX))
}

fn color(value: &str) -> DomainResult<String> {
    required_text("cor", value, Some(COLOR_MAX))
}

impl DashboardRecord for Protocol {
    type Input = ProtocolInput;
    type Patch = ProtocolPatch;

    fn create(company_id: CompanyId, input: Self::Input, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: RecordId::new(),
            company_id,
            kind: input.kind,
            title: title(&input.title)?,
            description: description(&input.description)?,
            icon: icon(&input.icon)?,
            color: color(&input.color)?,
            position: input.position,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> DomainResult<()> {
        let new_title = patch.title.as_deref().map(title).transpose()?;
        let new_description = patch.description.as_deref().map(description).transpose()?;
        let new_icon = patch.icon.as_deref().map(icon).transpose()?;
        let new_color = patch.color.as_deref().map(color).transpose()?;

        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(v) = new_title {
            self.title = v;
        }
        if let Some(v) = new_description {
            self.description = v;
        }
        if let Some(v) = new_icon {
            self.icon = v;
        }
        if let Some(v) = new_color {
            self.color = v;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        self.updated_at = now;
        Ok(())
    }
}

tenant_owned!(Protocol);

impl TenantRecord for Protocol {
    const KIND: &'static str = "dashboard.protocol";

    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    fn natural_key(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn protocol(json: serde_json::Value) -> DomainResult<Protocol> {
        let input: ProtocolInput = serde_json::from_value(json).unwrap();
        Protocol::create(CompanyId::new(), input, Utc::now())
    }

    #[test]
    fn defaults() {
        let p = protocol(json!({"tipo": "sla", "titulo": "Responder leads", "descricao": "Em até 5 minutos"})).unwrap();
        assert_eq!(p.color, "orange");
        assert_eq!(p.position, 0);
        assert_eq!(p.icon, "");
        assert_eq!(p.kind.name(), "SLA");
        assert_eq!(p.natural_key(), None);
    }

    #[test]
    fn title_limit() {
        let long = "t".repeat(101);
        assert!(protocol(json!({"tipo": "foco", "titulo": long, "descricao": "d"})).is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(serde_json::from_value::<ProtocolInput>(json!({"tipo": "x", "titulo": "t", "descricao": "d"})).is_err());
    }

    #[test]
    fn patch_validates_before_writing() {
        let mut p = protocol(json!({"tipo": "foco", "titulo": "t", "descricao": "d"})).unwrap();
        let before = p.clone();
        let patch = ProtocolPatch {
            kind: Some(ProtocolKind::Outro),
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(p.apply(patch, Utc::now()).is_err());
        assert_eq!(p, before);
    }
}
