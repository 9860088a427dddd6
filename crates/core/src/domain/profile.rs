use serde::{Deserialize, Serialize};

/// Company metadata shown in the profile block. Fields stay empty when the
/// upstream source does not know the ticker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub description: String,
    pub logo_url: String,
    pub short_name: String,
}

impl CompanyProfile {
    pub fn is_blank(&self) -> bool {
        self.description.is_empty() && self.logo_url.is_empty() && self.short_name.is_empty()
    }
}
