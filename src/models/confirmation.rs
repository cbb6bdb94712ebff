use serde::Deserialize;

/// Remote confirmation type codes. Steam sends these as integers in the
/// `getlist` payload; anything we do not recognize is `Unknown` and falls
/// under the OTHERS policy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u32")]
pub enum ConfirmationType {
    Trade,
    MarketSell,
    Unknown,
}

impl From<u32> for ConfirmationType {
    fn from(code: u32) -> Self {
        match code {
            2 => ConfirmationType::Trade,
            3 => ConfirmationType::MarketSell,
            _ => ConfirmationType::Unknown,
        }
    }
}

/// One pending mobile confirmation as returned by `mobileconf/getlist`.
/// `id` and `key` together identify it to the accept endpoint; `creator`
/// is the trade offer or market listing it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct Confirmation {
    pub id: String,
    #[serde(rename = "nonce")]
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ConfirmationType,
    #[serde(rename = "creator_id")]
    pub creator: String,
    #[serde(rename = "headline", default)]
    pub description: String,
}

#[cfg(test)]
impl Confirmation {
    pub fn stub(id: u64, kind: ConfirmationType) -> Self {
        Self {
            id: id.to_string(),
            key: (id * 7).to_string(),
            kind,
            creator: "0".to_string(),
            description: format!("confirmation {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_getlist_entry() {
        let raw = r#"{
            "type": 3,
            "type_name": "Market Listing",
            "id": "13199011569",
            "creator_id": "3392884950693551238",
            "nonce": "11237245758043683232",
            "headline": "100,00 pуб. (87,00 pуб.)"
        }"#;

        let conf: Confirmation = serde_json::from_str(raw).unwrap();
        assert_eq!(conf.kind, ConfirmationType::MarketSell);
        assert_eq!(conf.id, "13199011569");
        assert_eq!(conf.key, "11237245758043683232");
        assert_eq!(conf.creator, "3392884950693551238");
        assert!(conf.description.starts_with("100,00"));
    }

    #[test]
    fn unknown_type_codes_fold_to_unknown() {
        assert_eq!(ConfirmationType::from(2), ConfirmationType::Trade);
        assert_eq!(ConfirmationType::from(3), ConfirmationType::MarketSell);
        assert_eq!(ConfirmationType::from(1), ConfirmationType::Unknown);
        assert_eq!(ConfirmationType::from(99), ConfirmationType::Unknown);
    }

    #[test]
    fn missing_headline_defaults_to_empty() {
        let raw = r#"{"type": 2, "id": "1", "creator_id": "2", "nonce": "3"}"#;
        let conf: Confirmation = serde_json::from_str(raw).unwrap();
        assert_eq!(conf.kind, ConfirmationType::Trade);
        assert!(conf.description.is_empty());
    }
}
