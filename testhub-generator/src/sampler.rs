//! Deterministic schema-driven record sampler.
//!
//! [`SchemaSampler`] fills each record from the entity's JSON schema
//! `properties`, deriving every value from a SHA-256 seed of
//! `(template, entity, record index, field)`. The same request always yields
//! the same records, which keeps regenerated artifacts diffable.
//!
//! Supported property shapes:
//!
//! | schema | sampled value |
//! |---|---|
//! | `enum: [...]` | one of the listed values |
//! | `type: string` + `format: email / date / date-time / uuid` | formatted string |
//! | `type: string` | `"<Entity> <field> <n>"` |
//! | `type: integer` / `number` | bounded by `minimum` / `maximum` when present |
//! | `type: boolean` | `true` / `false` |
//! | `type: array` / `object` | empty container |
//!
//! Entities without a usable schema get `{ "id", "name" }` records.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use testhub_core::EntityData;

use crate::adapter::{EntitySchema, GenerationAdapter, GenerationRequest};
use crate::error::GenerateError;

/// Offline [`GenerationAdapter`] backed by the schema sampler.
#[derive(Debug, Clone, Default)]
pub struct SchemaSampler;

impl SchemaSampler {
    pub fn new() -> Self {
        Self
    }

    /// Sample every entity of `request` synchronously.
    pub fn sample(&self, request: &GenerationRequest) -> Result<EntityData, GenerateError> {
        let mut data = EntityData::new();
        for entity in &request.entities {
            let records = (0..request.records_per_entity)
                .map(|index| sample_record(&request.template_name, entity, index))
                .collect::<Result<Vec<_>, _>>()?;
            data.insert(entity.name.clone(), records);
        }
        Ok(data)
    }
}

#[async_trait]
impl GenerationAdapter for SchemaSampler {
    async fn generate(&self, request: &GenerationRequest) -> Result<EntityData, GenerateError> {
        self.sample(request)
    }
}

fn sample_record(
    template_name: &str,
    entity: &EntitySchema,
    index: usize,
) -> Result<Value, GenerateError> {
    let properties = match &entity.schema {
        Value::Null => None,
        Value::Object(schema) => match schema.get("properties") {
            None | Some(Value::Null) => None,
            Some(Value::Object(props)) => Some(props),
            Some(_) => {
                return Err(GenerateError::InvalidSchema {
                    entity: entity.name.clone(),
                    reason: "`properties` must be an object".to_string(),
                })
            }
        },
        _ => {
            return Err(GenerateError::InvalidSchema {
                entity: entity.name.clone(),
                reason: "schema must be a JSON object".to_string(),
            })
        }
    };

    let n = index + 1;
    let Some(properties) = properties.filter(|p| !p.is_empty()) else {
        return Ok(json!({ "id": n, "name": format!("{} {n}", entity.name) }));
    };

    let mut record = Map::new();
    for (field, spec) in properties {
        let seed = seed(&[template_name, &entity.name, &index.to_string(), field]);
        let value = if field == "id" && spec.get("type").and_then(Value::as_str) != Some("string")
        {
            json!(n)
        } else {
            sample_value(&entity.name, field, spec, n, &seed)?
        };
        record.insert(field.clone(), value);
    }
    Ok(Value::Object(record))
}

fn sample_value(
    entity: &str,
    field: &str,
    spec: &Value,
    n: usize,
    seed: &[u8; 32],
) -> Result<Value, GenerateError> {
    if let Some(options) = spec.get("enum").and_then(Value::as_array) {
        if !options.is_empty() {
            return Ok(options[pick(seed, options.len())].clone());
        }
    }

    let kind = spec.get("type").and_then(Value::as_str).unwrap_or("string");
    let value = match kind {
        "integer" => {
            let (min, max) = integer_bounds(entity, field, spec)?;
            let span = (i128::from(max) - i128::from(min)) as u128 + 1;
            let offset = (u128::from(seed_u64(seed)) % span) as i128;
            json!((i128::from(min) + offset) as i64)
        }
        "number" => {
            let (min, max) = bounds(spec, 0.0, 1000.0);
            let width = max - min;
            if !width.is_finite() {
                return Err(out_of_range(entity, field));
            }
            let unit = (seed_u64(seed) % 10_000) as f64 / 10_000.0;
            let value = min + width * unit;
            json!((value * 100.0).round() / 100.0)
        }
        "boolean" => json!(seed[0] % 2 == 0),
        "array" => json!([]),
        "object" => json!({}),
        _ => sample_string(entity, field, spec, n, seed),
    };
    Ok(value)
}

/// Integer `minimum`/`maximum` clamped to the `i64` range.
fn integer_bounds(entity: &str, field: &str, spec: &Value) -> Result<(i64, i64), GenerateError> {
    const LOWEST: f64 = i64::MIN as f64;
    const HIGHEST: f64 = i64::MAX as f64;

    let (min, max) = bounds(spec, 0.0, 1000.0);
    let min = min.ceil();
    let max = max.floor();
    if min > max || min >= HIGHEST || max < LOWEST {
        return Err(out_of_range(entity, field));
    }
    // `as` saturates, so anything past the i64 range lands on its edge.
    Ok((min.max(LOWEST) as i64, max.min(HIGHEST) as i64))
}

fn out_of_range(entity: &str, field: &str) -> GenerateError {
    GenerateError::InvalidSchema {
        entity: entity.to_string(),
        reason: format!("`{field}` has no representable range"),
    }
}

fn sample_string(entity: &str, field: &str, spec: &Value, n: usize, seed: &[u8; 32]) -> Value {
    let format = spec.get("format").and_then(Value::as_str).unwrap_or("");
    match format {
        "email" => json!(format!(
            "{}.{n}@example.test",
            entity.to_ascii_lowercase().replace(' ', ".")
        )),
        "date" => json!(sample_date(seed).format("%Y-%m-%d").to_string()),
        "date-time" => {
            let date = sample_date(seed);
            let at = date.and_hms_opt(u32::from(seed[1] % 24), u32::from(seed[2] % 60), 0);
            match at {
                Some(naive) => json!(Utc.from_utc_datetime(&naive).to_rfc3339()),
                None => json!(date.format("%Y-%m-%d").to_string()),
            }
        }
        "uuid" => {
            let h = hex::encode(&seed[..16]);
            json!(format!(
                "{}-{}-{}-{}-{}",
                &h[0..8],
                &h[8..12],
                &h[12..16],
                &h[16..20],
                &h[20..32]
            ))
        }
        _ => json!(format!("{entity} {field} {n}")),
    }
}

fn sample_date(seed: &[u8; 32]) -> NaiveDate {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN);
    base + Duration::days((seed_u64(seed) % 365) as i64)
}

fn bounds(spec: &Value, default_min: f64, default_max: f64) -> (f64, f64) {
    let min = spec
        .get("minimum")
        .and_then(Value::as_f64)
        .unwrap_or(default_min);
    let max = spec
        .get("maximum")
        .and_then(Value::as_f64)
        .unwrap_or(default_max.max(min));
    (min, max.max(min))
}

fn seed(parts: &[&str]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.finalize().into()
}

fn seed_u64(seed: &[u8; 32]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&seed[..8]);
    u64::from_be_bytes(bytes)
}

fn pick(seed: &[u8; 32], len: usize) -> usize {
    (seed_u64(seed) % len as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn invoice_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer" },
                "customer_email": { "type": "string", "format": "email" },
                "amount": { "type": "number", "minimum": 10, "maximum": 20 },
                "status": { "enum": ["draft", "sent", "paid"] },
                "issued_on": { "type": "string", "format": "date" },
                "paid": { "type": "boolean" }
            }
        })
    }

    fn request(entities: Vec<EntitySchema>) -> GenerationRequest {
        GenerationRequest::new("Invoices Page", entities)
    }

    #[test]
    fn produces_requested_count_per_entity() {
        let data = SchemaSampler::new()
            .sample(&request(vec![
                EntitySchema::new("Invoice", invoice_schema()),
                EntitySchema::new("Customer", Value::Null),
            ]))
            .expect("sample");
        assert_eq!(data["Invoice"].len(), 3);
        assert_eq!(data["Customer"].len(), 3);
    }

    #[test]
    fn output_is_deterministic() {
        let req = request(vec![EntitySchema::new("Invoice", invoice_schema())]);
        let a = SchemaSampler::new().sample(&req).expect("a");
        let b = SchemaSampler::new().sample(&req).expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn values_respect_schema() {
        let data = SchemaSampler::new()
            .sample(&request(vec![EntitySchema::new("Invoice", invoice_schema())]))
            .expect("sample");
        for (i, record) in data["Invoice"].iter().enumerate() {
            assert_eq!(record["id"], json!(i + 1));
            let amount = record["amount"].as_f64().expect("amount");
            assert!((10.0..=20.0).contains(&amount), "amount {amount}");
            let status = record["status"].as_str().expect("status");
            assert!(["draft", "sent", "paid"].contains(&status));
            assert!(record["customer_email"]
                .as_str()
                .expect("email")
                .ends_with("@example.test"));
            assert_eq!(record["issued_on"].as_str().expect("date").len(), 10);
            assert!(record["paid"].is_boolean());
        }
    }

    #[test]
    fn schemaless_entity_gets_id_and_name() {
        let data = SchemaSampler::new()
            .sample(&request(vec![EntitySchema::new("Note", json!({}))]))
            .expect("sample");
        assert_eq!(data["Note"][0], json!({ "id": 1, "name": "Note 1" }));
    }

    #[rstest]
    #[case(json!("not an object"))]
    #[case(json!({ "properties": [1, 2] }))]
    fn rejects_unusable_schema(#[case] schema: Value) {
        let err = SchemaSampler::new()
            .sample(&request(vec![EntitySchema::new("Broken", schema)]))
            .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidSchema { .. }));
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn huge_integer_bounds_are_clamped() {
        let schema = json!({
            "properties": {
                "qty": { "type": "integer", "minimum": 0, "maximum": 1e20 },
                "delta": { "type": "integer", "minimum": -1e30, "maximum": 1e30 }
            }
        });
        let data = SchemaSampler::new()
            .sample(&request(vec![EntitySchema::new("Stock", schema)]))
            .expect("sample");
        for record in &data["Stock"] {
            assert!(record["qty"].as_i64().expect("qty") >= 0);
            assert!(record["delta"].is_i64());
        }
    }

    #[rstest]
    #[case(json!({ "type": "integer", "minimum": 1e20, "maximum": 2e20 }))]
    #[case(json!({ "type": "integer", "minimum": 0.2, "maximum": 0.8 }))]
    #[case(json!({ "type": "number", "minimum": -1e308, "maximum": 1e308 }))]
    fn unrepresentable_range_is_invalid(#[case] field: Value) {
        let schema = json!({ "properties": { "qty": field } });
        let err = SchemaSampler::new()
            .sample(&request(vec![EntitySchema::new("Stock", schema)]))
            .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidSchema { .. }));
        assert!(err.to_string().contains("qty"));
    }

    #[test]
    fn honours_custom_record_count() {
        let req = request(vec![EntitySchema::new("Invoice", Value::Null)]).with_records_per_entity(5);
        let data = SchemaSampler::new().sample(&req).expect("sample");
        assert_eq!(data["Invoice"].len(), 5);
    }
}
