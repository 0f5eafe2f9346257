//! ERA5 daily statistics request construction
//!
//! Builds the collection id and input parameters submitted to the retrieve
//! API from a variable, a year and the data type.

use chrono::Datelike;
use serde_json::{json, Map, Value};

use crate::constants::request;
use crate::errors::RequestError;

/// Kind of ERA5 daily statistics product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    SingleLevel,
    PressureLevel,
}

impl DataType {
    /// Collection the product is retrieved from
    pub fn collection_id(&self) -> &'static str {
        match self {
            Self::SingleLevel => request::SINGLE_LEVEL_COLLECTION,
            Self::PressureLevel => request::PRESSURE_LEVEL_COLLECTION,
        }
    }
}

/// A complete submission: collection plus inputs
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub collection_id: String,
    pub inputs: Map<String, Value>,
}

impl DataRequest {
    /// Build a request for one variable and one year of daily means
    pub fn build(
        data_type: DataType,
        variable: &str,
        year: i32,
        pressure_level: Option<u32>,
    ) -> Result<Self, RequestError> {
        let variable = variable.trim();
        if variable.is_empty() {
            return Err(RequestError::MissingField {
                field: "variable".to_string(),
            });
        }

        let last = chrono::Utc::now().year();
        if !(request::FIRST_YEAR..=last).contains(&year) {
            return Err(RequestError::YearOutOfRange {
                year,
                first: request::FIRST_YEAR,
                last,
            });
        }

        let mut inputs = Map::new();
        inputs.insert("product_type".into(), json!(request::PRODUCT_TYPE));
        inputs.insert("variable".into(), json!([variable]));
        inputs.insert("year".into(), json!([year.to_string()]));
        inputs.insert(
            "month".into(),
            json!((1..=12).map(|m| m.to_string()).collect::<Vec<_>>()),
        );
        inputs.insert(
            "day".into(),
            json!((1..=31).map(|d| d.to_string()).collect::<Vec<_>>()),
        );
        inputs.insert("daily_statistic".into(), json!(request::DAILY_STATISTIC));
        inputs.insert("time_zone".into(), json!(request::TIME_ZONE));
        inputs.insert("frequency".into(), json!(request::FREQUENCY));
        inputs.insert("data_format".into(), json!(request::DATA_FORMAT));

        match (data_type, pressure_level) {
            (DataType::SingleLevel, None) => {}
            (DataType::SingleLevel, Some(level)) => {
                return Err(RequestError::PressureLevel {
                    reason: format!("{} hPa given for single-level data", level),
                });
            }
            (DataType::PressureLevel, None) => {
                return Err(RequestError::PressureLevel {
                    reason: "pressure-level data needs --plevel".to_string(),
                });
            }
            (DataType::PressureLevel, Some(level)) => {
                inputs.insert("pressure_level".into(), json!([level.to_string()]));
            }
        }

        Ok(Self {
            collection_id: data_type.collection_id().to_string(),
            inputs,
        })
    }

    /// JSON body for the execution endpoint
    pub fn body(&self) -> Value {
        json!({ "inputs": self.inputs })
    }

    /// First variable of the request
    pub fn variable(&self) -> Option<&str> {
        self.first("variable")
    }

    /// First year of the request
    pub fn year(&self) -> Option<&str> {
        self.first("year")
    }

    fn first(&self, key: &str) -> Option<&str> {
        match self.inputs.get(key)? {
            Value::Array(items) => items.first()?.as_str(),
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}
