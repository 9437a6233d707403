use serde::{Deserialize, Serialize};

/// Legal links attached to every migrated application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Legal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<String>,
}

impl Legal {
    /// Drops empty entries. Returns `None` when nothing is left.
    pub fn non_empty(&self) -> Option<Legal> {
        let keep = |v: &Option<String>| v.as_ref().filter(|s| !s.is_empty()).cloned();
        let legal = Legal {
            contact: keep(&self.contact),
            imprint: keep(&self.imprint),
            privacy: keep(&self.privacy),
        };
        if legal.contact.is_none() && legal.imprint.is_none() && legal.privacy.is_none() {
            None
        } else {
            Some(legal)
        }
    }
}

/// Branding of migrated applications. Passed through without validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complementary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_path: Option<String>,
}

impl Theme {
    pub fn is_empty(&self) -> bool {
        self == &Theme::default()
    }
}
