use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Row of the generated-questions table, written by the external job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub questions: Option<String>, // opaque payload from the job
    #[serde(
        default,
        serialize_with = "time::serde::rfc3339::option::serialize",
        deserialize_with = "warehouse_timestamp::deserialize"
    )]
    pub generated_at: Option<OffsetDateTime>,
}

/// Warehouse timestamps arrive either as RFC 3339 or as `YYYY-MM-DD HH:MM:SS[.fff]` in UTC.
/// A NULL cell stays `None`.
mod warehouse_timestamp {
    use serde::{de::Error, Deserialize, Deserializer};
    use time::{
        format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
        PrimitiveDateTime,
    };

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        if let Ok(ts) = OffsetDateTime::parse(&raw, &Rfc3339) {
            return Ok(Some(ts));
        }
        let naive =
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");
        PrimitiveDateTime::parse(&raw.replacen('T', " ", 1), naive)
            .map(|ts| Some(ts.assume_utc()))
            .map_err(|e| D::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}
