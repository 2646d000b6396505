use serde::de::{self, DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `{ "success": bool, "data": T?, "message": string? }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(alias = "totalPages")]
    pub total_pages: u32,
}

/// Payload for endpoints that return nothing. Deserializes from any JSON
/// value, including a missing `data` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EmptyPayload {}

impl<'de> Deserialize<'de> for EmptyPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        IgnoredAny::deserialize(deserializer)?;
        Ok(EmptyPayload {})
    }
}

/// Paginated collection. Decodes itself from the whole response body, which
/// may take any of three layouts:
///
/// 1. `{ "success": true, "data": { "pagination": {..}, "items": [..] } }`
/// 2. `{ "success": true, "data": [..], "pagination": {..} }`
/// 3. `{ "success": true, "data": [..] }`
#[derive(Clone, Debug, PartialEq)]
pub struct ListPayload<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct NestedList<T> {
    #[serde(default)]
    pagination: Option<Pagination>,
    items: Vec<T>,
}

impl<T: DeserializeOwned> ListPayload<T> {
    pub fn new(items: Vec<T>, pagination: Option<Pagination>) -> Self {
        Self { items, pagination }
    }

    pub fn from_root(root: &Value) -> Result<Self, String> {
        if let Ok(envelope) = ApiEnvelope::<NestedList<T>>::deserialize(root)
            && envelope.success
        {
            return match envelope.data {
                Some(nested) => Ok(Self::new(nested.items, nested.pagination)),
                None => Err("envelope reports success but carries no data".into()),
            };
        }

        if root.get("success").and_then(Value::as_bool) == Some(true)
            && let Some(data) = root.get("data")
            && let Ok(items) = Vec::<T>::deserialize(data)
        {
            let pagination = root
                .get("pagination")
                .and_then(|p| Pagination::deserialize(p).ok());
            return Ok(Self::new(items, pagination));
        }

        if let Ok(envelope) = ApiEnvelope::<Vec<T>>::deserialize(root)
            && envelope.success
        {
            return Ok(Self::new(envelope.data.unwrap_or_default(), None));
        }

        Err("unsupported list payload shape".into())
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ListPayload<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let root = Value::deserialize(deserializer)?;
        ListPayload::from_root(&root).map_err(de::Error::custom)
    }
}
