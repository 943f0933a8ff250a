use chrono::NaiveDateTime;

/// One planned or unplanned outage as reported by the upstream API.
#[derive(Debug, Clone, PartialEq)]
pub struct OutageRecord {
    pub description: String,
    pub start_at: NaiveDateTime,
    pub stop_at: NaiveDateTime,
    pub revoked: bool,
    /// Upstream sometimes fills this even when `revoked` is false.
    pub revoked_description: Option<String>,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Building number range, free text (e.g. "1-15, 17").
    pub numbers: Option<String>,
    pub teryt: Option<AddressTeryt>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressTeryt {
    pub street_name: Option<String>,
}

impl Address {
    pub fn street_name(&self) -> Option<&str> {
        self.teryt.as_ref().and_then(|t| t.street_name.as_deref())
    }
}
