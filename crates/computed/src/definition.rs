//! Computed column definitions and their introspection records.

use crate::combiner::Combiner;
use crate::methods::ComputedMethod;
use pivotal_core::{DataType, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Declaration of one computed column.
#[derive(Clone)]
pub struct ComputedColumnDef {
    /// Output column name.
    pub column: String,
    /// Output column type.
    pub data_type: DataType,
    /// Input column names in argument order. May repeat a name.
    pub inputs: Vec<String>,
    /// Combining function. When absent, `func_name` must name a built-in.
    pub func: Option<Arc<dyn Combiner>>,
    /// Symbolic name of the operation.
    pub func_name: Option<String>,
    /// Opaque metadata, returned verbatim by `describe`.
    pub computation: Option<serde_json::Value>,
    /// Declared input type.
    pub input_type: Option<DataType>,
}

impl ComputedColumnDef {
    pub fn new<I, S>(column: impl Into<String>, data_type: DataType, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            data_type,
            inputs: inputs.into_iter().map(Into::into).collect(),
            func: None,
            func_name: None,
            computation: None,
            input_type: None,
        }
    }

    pub fn with_func(mut self, func: impl Combiner + 'static) -> Self {
        self.func = Some(Arc::new(func));
        self
    }

    pub fn with_func_name(mut self, func_name: impl Into<String>) -> Self {
        self.func_name = Some(func_name.into());
        self
    }

    pub fn with_computation(mut self, computation: serde_json::Value) -> Self {
        self.computation = Some(computation);
        self
    }

    pub fn with_input_type(mut self, input_type: DataType) -> Self {
        self.input_type = Some(input_type);
        self
    }

    /// Returns the combiner, resolving `func_name` to a built-in when no
    /// function was supplied.
    pub fn combiner(&self) -> Result<Arc<dyn Combiner>> {
        if let Some(func) = &self.func {
            return Ok(Arc::clone(func));
        }
        match &self.func_name {
            Some(name) => {
                let method: ComputedMethod = name.parse()?;
                Ok(Arc::new(method))
            }
            None => Err(Error::invalid_schema(format!(
                "computed column {} has no function",
                self.column
            ))),
        }
    }
}

impl fmt::Debug for ComputedColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedColumnDef")
            .field("column", &self.column)
            .field("data_type", &self.data_type)
            .field("inputs", &self.inputs)
            .field("func", &self.func.as_ref().map(|c| c.arity()))
            .field("func_name", &self.func_name)
            .field("computation", &self.computation)
            .field("input_type", &self.input_type)
            .finish()
    }
}

/// Introspection record of a registered computed column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputedColumnInfo {
    pub input_columns: Vec<String>,
    pub input_type: Option<DataType>,
    pub computation: Option<serde_json::Value>,
    #[serde(rename = "type")]
    pub data_type: DataType,
}
