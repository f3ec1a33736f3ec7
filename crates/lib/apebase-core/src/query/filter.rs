use std::collections::BTreeMap;
use std::fmt;

use apebase_store::schema::FIELD_DOC;
use serde_json::{Map, Value};

use super::ValidationError;

/// A validated structural match over token documents.
///
/// Keys are dotted field paths into the stored document; values are either
/// literals matched by equality or operator objects such as `{"$gt": 3}`.
/// Top-level `$and`, `$or` and `$not` combine nested filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    conditions: Map<String, Value>,
    compiled: CompiledFilter,
}

impl Default for Filter {
    fn default() -> Self {
        Self::match_all()
    }
}

impl Filter {
    #[must_use]
    pub fn match_all() -> Self {
        Self {
            conditions: Map::new(),
            compiled: CompiledFilter::default(),
        }
    }

    /// Parses filter text supplied by a caller. Blank text matches all.
    ///
    /// # Errors
    /// Returns `ValidationError` if the text is not a JSON object or the
    /// object is not a valid filter.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        if text.trim().is_empty() {
            return Ok(Self::match_all());
        }
        let value: Value = serde_json::from_str(text)
            .map_err(|err| ValidationError::InvalidJson(err.to_string()))?;
        Self::from_value(value)
    }

    /// Validates structured filter data.
    ///
    /// # Errors
    /// Returns `ValidationError` if the value is not an object, a path is
    /// malformed, or an operator is unknown or misused.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(conditions) = value else {
            return Err(ValidationError::NotAnObject);
        };
        let mut compiler = Compiler::default();
        let condition = compiler.object(&conditions)?;
        Ok(Self {
            conditions,
            compiled: CompiledFilter {
                condition,
                bindings: compiler.bindings,
            },
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[must_use]
    pub const fn conditions(&self) -> &Map<String, Value> {
        &self.conditions
    }

    #[must_use]
    pub const fn compiled(&self) -> &CompiledFilter {
        &self.compiled
    }

    /// Pretty-printed JSON of the filter, for echoing back to the caller.
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.conditions).unwrap_or_else(|_| "{}".to_string())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.conditions) {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("{}"),
        }
    }
}

/// SurrealQL condition and its bound parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilter {
    condition: Option<String>,
    bindings: BTreeMap<String, Value>,
}

impl CompiledFilter {
    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    #[must_use]
    pub const fn bindings(&self) -> &BTreeMap<String, Value> {
        &self.bindings
    }

    /// Returns ` WHERE <condition>` or an empty string when matching all.
    #[must_use]
    pub fn where_clause(&self) -> String {
        self.condition
            .as_ref()
            .map_or_else(String::new, |condition| format!(" WHERE {condition}"))
    }
}

#[derive(Default)]
struct Compiler {
    bindings: BTreeMap<String, Value>,
}

impl Compiler {
    fn bind(&mut self, value: Value) -> String {
        let name = format!("f{}", self.bindings.len());
        let placeholder = format!("${name}");
        self.bindings.insert(name, value);
        placeholder
    }

    fn object(
        &mut self,
        conditions: &Map<String, Value>,
    ) -> Result<Option<String>, ValidationError> {
        let mut clauses = Vec::with_capacity(conditions.len());
        for (key, value) in conditions {
            let clause = match key.as_str() {
                "$and" => self.logical(key, value, " AND ", "true")?,
                "$or" => self.logical(key, value, " OR ", "false")?,
                "$not" => {
                    let Value::Object(inner) = value else {
                        return Err(invalid_operand(key, "an object"));
                    };
                    let inner = self.object(inner)?.unwrap_or_else(|| "true".to_string());
                    format!("!({inner})")
                }
                operator if operator.starts_with('$') => {
                    return Err(ValidationError::UnknownOperator(operator.to_string()));
                }
                path => self.field(path, value)?,
            };
            clauses.push(clause);
        }
        if clauses.is_empty() {
            return Ok(None);
        }
        Ok(Some(clauses.join(" AND ")))
    }

    fn logical(
        &mut self,
        operator: &str,
        value: &Value,
        joiner: &str,
        empty: &str,
    ) -> Result<String, ValidationError> {
        let Value::Array(items) = value else {
            return Err(invalid_operand(operator, "an array of filters"));
        };
        let mut clauses = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(inner) = item else {
                return Err(invalid_operand(operator, "an array of filters"));
            };
            clauses.push(self.object(inner)?.unwrap_or_else(|| "true".to_string()));
        }
        if clauses.is_empty() {
            return Ok(empty.to_string());
        }
        let wrapped: Vec<String> = clauses.iter().map(|clause| format!("({clause})")).collect();
        Ok(format!("({})", wrapped.join(joiner)))
    }

    fn field(&mut self, path: &str, value: &Value) -> Result<String, ValidationError> {
        let path_expr = field_path(path)?;
        match value {
            Value::Object(operators) if operators.keys().any(|key| key.starts_with('$')) => {
                if !operators.keys().all(|key| key.starts_with('$')) {
                    return Err(ValidationError::MixedOperators(path.to_string()));
                }
                let mut clauses = Vec::with_capacity(operators.len());
                for (operator, operand) in operators {
                    clauses.push(self.operator(&path_expr, operator, operand)?);
                }
                Ok(format!("({})", clauses.join(" AND ")))
            }
            literal => {
                let param = self.bind(literal.clone());
                Ok(matches_value(&path_expr, &param))
            }
        }
    }

    fn operator(
        &mut self,
        path: &str,
        operator: &str,
        operand: &Value,
    ) -> Result<String, ValidationError> {
        let clause = match operator {
            "$ne" => {
                let param = self.bind(operand.clone());
                format!("!{}", matches_value(path, &param))
            }
            "$gt" | "$gte" | "$lt" | "$lte" => {
                let symbol = match operator {
                    "$gt" => ">",
                    "$gte" => ">=",
                    "$lt" => "<",
                    _ => "<=",
                };
                // only values of the operand's own type are ordered against it
                let guard = match operand {
                    Value::Number(_) => "type::is::number",
                    Value::String(_) => "type::is::string",
                    _ => return Err(invalid_operand(operator, "a number or a string")),
                };
                let param = self.bind(operand.clone());
                format!("({guard}({path}) AND {path} {symbol} {param})")
            }
            "$in" | "$nin" => {
                if !operand.is_array() {
                    return Err(invalid_operand(operator, "an array"));
                }
                let param = self.bind(operand.clone());
                let member = format!("({path} IN {param} OR {path} ANYINSIDE {param})");
                if operator == "$in" {
                    member
                } else {
                    format!("!{member}")
                }
            }
            "$exists" => match operand {
                Value::Bool(true) => format!("({path} != NONE)"),
                Value::Bool(false) => format!("({path} = NONE)"),
                _ => return Err(invalid_operand(operator, "a boolean")),
            },
            other => return Err(ValidationError::UnknownOperator(other.to_string())),
        };
        Ok(clause)
    }
}

/// Equality that also matches any element of an array field.
fn matches_value(path: &str, param: &str) -> String {
    format!("({path} = {param} OR {path} ?= {param})")
}

fn invalid_operand(operator: &str, expected: &'static str) -> ValidationError {
    ValidationError::InvalidOperand {
        operator: operator.to_string(),
        expected,
    }
}

/// Translates a dotted path into an escaped idiom under the stored document.
fn field_path(path: &str) -> Result<String, ValidationError> {
    let mut idiom = String::from(FIELD_DOC);
    for segment in path.split('.') {
        if segment.is_empty()
            || segment.starts_with('$')
            || segment.contains('`')
            || segment.contains('\\')
        {
            return Err(ValidationError::InvalidPath(path.to_string()));
        }
        if segment.bytes().all(|byte| byte.is_ascii_digit()) {
            let index: usize = segment
                .parse()
                .map_err(|_| ValidationError::InvalidPath(path.to_string()))?;
            idiom.push_str(&format!("[{index}]"));
        } else {
            idiom.push_str(&format!(".`{segment}`"));
        }
    }
    Ok(idiom)
}
