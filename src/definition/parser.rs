//! Definition builders driven by tokenized parameter lists
//!
//! The configuration front-end splits each definition line into a keyword and its
//! parameters. The parsers here validate those parameters and turn them into
//! [`DefinitionBuilder`]s; nothing is registered unless validation succeeds.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::{Definition, DefinitionBuilder, DefinitionRegistry, Namespace, SourceLocation};
use crate::types::{ByteOrder, DataType, Shape, Value};
use crate::{LogError, Result};

/// A keyword and its already tokenized parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterList {
    keyword: String,
    parameters: Vec<String>,
    filename: Option<PathBuf>,
    line: usize,
}

impl ParameterList {
    pub fn new<I, S>(keyword: &str, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyword: keyword.to_ascii_uppercase(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            filename: None,
            line: 0,
        }
    }

    /// Record where the parameters came from.
    pub fn at(mut self, filename: impl Into<PathBuf>, line: usize) -> Self {
        self.filename = Some(filename.into());
        self.line = line;
        self
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn parameter(&self, index: usize) -> Option<&str> {
        self.parameters.get(index).map(String::as_str)
    }

    pub fn source_location(&self) -> SourceLocation {
        SourceLocation { filename: self.filename.clone(), line: self.line }
    }

    /// Fail with [`LogError::InvalidArity`] unless `min <= len <= max`.
    pub fn verify_num_parameters(&self, min: usize, max: usize, usage: &str) -> Result<()> {
        let found = self.parameters.len();
        if found < min || found > max {
            return Err(LogError::InvalidArity {
                keyword: self.keyword.clone(),
                min,
                max,
                found,
                usage: usage.to_string(),
            });
        }
        Ok(())
    }

    fn required(&self, index: usize) -> &str {
        self.parameter(index).unwrap_or_default()
    }
}

/// Builds table definitions from `TABLE` parameter lists.
pub struct TableParser;

impl TableParser {
    pub const USAGE: &'static str = "TABLE <TABLE NAME> <ENDIANNESS: BIG_ENDIAN/LITTLE_ENDIAN> <DISPLAY: ONE_DIMENSIONAL/TWO_DIMENSIONAL> <TWO_DIMENSIONAL TABLE ROWS> <DESCRIPTION (Optional)>";

    /// Validate the parameters and return an unregistered builder.
    pub fn parse(params: &ParameterList) -> Result<DefinitionBuilder> {
        params.verify_num_parameters(3, 5, Self::USAGE)?;

        let table_name = params.required(0);
        let byte_order = parse_byte_order(params.required(1), Self::USAGE)?;

        let shape_token = params.required(2);
        let (shape, description) = match shape_token.to_ascii_uppercase().as_str() {
            "ONE_DIMENSIONAL" => {
                params.verify_num_parameters(3, 4, Self::USAGE)?;
                (Shape::OneDimensional, params.parameter(3))
            }
            "TWO_DIMENSIONAL" => {
                params.verify_num_parameters(4, 5, Self::USAGE)?;
                let rows_token = params.required(3);
                let rows = rows_token.parse::<u32>().ok().filter(|rows| *rows > 0).ok_or_else(
                    || LogError::invalid_parameter("table rows", rows_token, "must be a positive integer"),
                )?;
                (Shape::TwoDimensional { rows }, params.parameter(4))
            }
            _ => {
                return Err(LogError::InvalidShape {
                    value: shape_token.to_string(),
                    usage: Self::USAGE.to_string(),
                });
            }
        };

        debug!("Parsed table {} ({}, {})", table_name, byte_order, shape.keyword());
        Ok(DefinitionBuilder::table(table_name, byte_order, shape)
            .with_description(description.unwrap_or_default())
            .with_source(params.source_location()))
    }

    /// Parse and register a table in one step.
    pub fn parse_table(
        params: &ParameterList,
        registry: &mut DefinitionRegistry,
        warnings: &mut Vec<String>,
    ) -> Result<Arc<Definition>> {
        Ok(Self::parse(params)?.finish(registry, warnings))
    }
}

/// Builds packet definitions from `COMMAND` and `TELEMETRY` parameter lists.
pub struct PacketParser;

impl PacketParser {
    pub const USAGE: &'static str = "<COMMAND/TELEMETRY> <TARGET NAME> <PACKET NAME> <ENDIANNESS: BIG_ENDIAN/LITTLE_ENDIAN> <DESCRIPTION (Optional)>";

    pub fn parse(params: &ParameterList) -> Result<DefinitionBuilder> {
        let namespace = match params.keyword() {
            "COMMAND" => Namespace::Command,
            "TELEMETRY" => Namespace::Telemetry,
            other => {
                return Err(LogError::invalid_parameter(
                    "keyword",
                    other,
                    "packet definitions start with COMMAND or TELEMETRY",
                ));
            }
        };
        params.verify_num_parameters(3, 4, Self::USAGE)?;

        let byte_order = parse_byte_order(params.required(2), Self::USAGE)?;
        Ok(DefinitionBuilder::packet(namespace, params.required(0), params.required(1), byte_order)
            .with_description(params.parameter(3).unwrap_or_default())
            .with_source(params.source_location()))
    }

    /// Parse and register a packet without items.
    pub fn parse_packet(
        params: &ParameterList,
        registry: &mut DefinitionRegistry,
        warnings: &mut Vec<String>,
    ) -> Result<Arc<Definition>> {
        Ok(Self::parse(params)?.finish(registry, warnings))
    }
}

/// Appends items to a definition under construction.
///
/// Accepted keywords:
/// - `APPEND_ITEM` / `APPEND_PARAMETER`: `<NAME> <BIT SIZE> <TYPE> [<DEFAULT>] [<DESCRIPTION>]`
/// - `APPEND_ID_ITEM` / `APPEND_ID_PARAMETER`: `<NAME> <BIT SIZE> <TYPE> <ID VALUE> [<DESCRIPTION>]`
pub struct ItemParser;

impl ItemParser {
    pub const USAGE: &'static str =
        "APPEND_ITEM <ITEM NAME> <BIT SIZE> <TYPE: INT/UINT/FLOAT/STRING/BLOCK> <DEFAULT (Optional)> <DESCRIPTION (Optional)>";
    pub const ID_USAGE: &'static str =
        "APPEND_ID_ITEM <ITEM NAME> <BIT SIZE> <TYPE: INT/UINT/FLOAT/STRING/BLOCK> <ID VALUE> <DESCRIPTION (Optional)>";

    pub fn parse(params: &ParameterList, builder: &mut DefinitionBuilder) -> Result<()> {
        let id_item = match params.keyword() {
            "APPEND_ITEM" | "APPEND_PARAMETER" => false,
            "APPEND_ID_ITEM" | "APPEND_ID_PARAMETER" => true,
            other => {
                return Err(LogError::invalid_parameter(
                    "keyword",
                    other,
                    "items are added with APPEND_ITEM or APPEND_ID_ITEM",
                ));
            }
        };

        if id_item {
            params.verify_num_parameters(4, 5, Self::ID_USAGE)?;
        } else {
            params.verify_num_parameters(3, 5, Self::USAGE)?;
        }

        let name = params.required(0);
        let bit_size_token = params.required(1);
        let bit_size = bit_size_token.parse::<usize>().map_err(|_| {
            LogError::invalid_parameter("bit size", bit_size_token, "must be a positive integer")
        })?;
        let data_type = DataType::from_token(params.required(2), bit_size)?;
        let literal = params.parameter(3).map(|text| Value::parse_literal(text, &data_type)).transpose()?;
        let description = params.parameter(4).map(str::to_string);

        if id_item {
            builder.push_item(name, data_type, None, literal, description)
        } else {
            builder.push_item(name, data_type, literal, None, description)
        }
    }
}

fn parse_byte_order(token: &str, usage: &str) -> Result<ByteOrder> {
    ByteOrder::from_token(token).ok_or_else(|| LogError::InvalidByteOrder {
        value: token.to_string(),
        usage: usage.to_string(),
    })
}
