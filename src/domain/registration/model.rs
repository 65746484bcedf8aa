use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Pending,
    Registered,
}

/// Inbound OCPI credentials issued to a roaming partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoamingCredential {
    pub token: String,
    pub status: RegistrationStatus,
    pub country_code: String,
    pub party_id: String,
}

impl RoamingCredential {
    pub fn is_registered(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }

    pub fn is_owned_by(&self, country_code: &str, party_id: &str) -> bool {
        self.country_code.eq_ignore_ascii_case(country_code)
            && self.party_id.eq_ignore_ascii_case(party_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyRole {
    Cpo,
    Emsp,
    Hub,
    Nap,
    Nsp,
    Other,
    Scsp,
}

impl PartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpo => "CPO",
            Self::Emsp => "EMSP",
            Self::Hub => "HUB",
            Self::Nap => "NAP",
            Self::Nsp => "NSP",
            Self::Other => "OTHER",
            Self::Scsp => "SCSP",
        }
    }
}

/// A roaming partner and the credentials used to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcpiParty {
    pub role: PartyRole,
    pub country_code: String,
    pub party_id: String,
    /// Versions endpoint of the partner.
    pub url: String,
    /// Token the partner accepts from us.
    pub token: String,
}

impl OcpiParty {
    pub fn key(&self) -> String {
        party_key(self.role, &self.country_code, &self.party_id)
    }
}

pub fn party_key(role: PartyRole, country_code: &str, party_id: &str) -> String {
    format!(
        "{}:{}:{}",
        role.as_str(),
        country_code.to_ascii_uppercase(),
        party_id.to_ascii_uppercase()
    )
}
