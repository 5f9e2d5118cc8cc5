use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter::validate_identifier;
use super::types::FilterOp;

/// Maximum nesting of `$and` groups.
pub const MAX_NESTED_DEPTH: usize = 8;

/// Compiles a JSON WHERE document into a parameterised SQL predicate.
///
/// Supported shapes:
/// - `{ "col": value }` implicit equality, `{ "col": null }` is `IS NULL`
/// - `{ "col": { "$ilike": "%x%", "$in": [...] } }` operator objects
/// - `{ "$and": [..] }` conjunction groups
///
/// Sibling keys of one object are joined with AND.
pub struct FilterWhere {
    starting_param_index: usize,
    param_values: Vec<Value>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            starting_param_index,
            param_values: vec![],
        }
    }

    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.build(where_data, 0)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value, depth: usize) -> Result<String, FilterError> {
        if depth > MAX_NESTED_DEPTH {
            return Err(FilterError::NestingTooDeep(MAX_NESTED_DEPTH));
        }
        match where_data {
            Value::Null => Ok("1=1".to_string()),
            Value::Object(obj) => self.build_object(obj, depth),
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn build_object(&mut self, obj: &Map<String, Value>, depth: usize) -> Result<String, FilterError> {
        let mut sql_conditions = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                sql_conditions.push(self.build_logical(key, value, depth)?);
            } else {
                sql_conditions.extend(self.build_field(key, value)?);
            }
        }
        Ok(match sql_conditions.len() {
            0 => "1=1".to_string(),
            1 => sql_conditions.remove(0),
            _ => sql_conditions.join(" AND "),
        })
    }

    fn build_logical(&mut self, op: &str, value: &Value, depth: usize) -> Result<String, FilterError> {
        if op != "$and" {
            return Err(FilterError::UnsupportedOperator(op.to_string()));
        }
        let arr = value
            .as_array()
            .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
        if arr.is_empty() {
            return Ok("1=1".to_string());
        }
        let mut sql_parts = Vec::with_capacity(arr.len());
        for v in arr {
            sql_parts.push(format!("({})", self.build(v, depth + 1)?));
        }
        Ok(format!("({})", sql_parts.join(" AND ")))
    }

    fn build_field(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        validate_identifier(field).map_err(FilterError::InvalidColumn)?;
        let quoted_column = format!("\"{}\"", field);

        match value {
            Value::Object(obj) => {
                let mut out = Vec::with_capacity(obj.len());
                for (op_key, op_val) in obj {
                    let operator = FilterOp::parse(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    out.push(self.build_condition(&quoted_column, operator, op_val)?);
                }
                Ok(out)
            }
            // Implicit equality: { field: value }
            other => Ok(vec![self.build_condition(&quoted_column, FilterOp::Eq, other)?]),
        }
    }

    fn build_condition(&mut self, quoted_column: &str, operator: FilterOp, data: &Value) -> Result<String, FilterError> {
        match operator {
            FilterOp::Eq if data.is_null() => Ok(format!("{} IS NULL", quoted_column)),
            FilterOp::Eq => self.scalar(quoted_column, operator, data),
            FilterOp::ILike => {
                if !data.is_string() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{} requires a string pattern",
                        operator.to_sql()
                    )));
                }
                self.scalar(quoted_column, operator, data)
            }
            FilterOp::In => self.membership(quoted_column, data),
        }
    }

    fn scalar(&mut self, quoted_column: &str, operator: FilterOp, data: &Value) -> Result<String, FilterError> {
        if data.is_array() || data.is_object() {
            return Err(FilterError::InvalidOperatorData(format!(
                "{} requires a scalar value",
                operator.to_sql()
            )));
        }
        let placeholder = self.param(data.clone());
        Ok(format!("{} {} {}", quoted_column, operator.to_sql(), placeholder))
    }

    /// `$in`. A `null` member matches NULL rows, which a plain `IN (NULL)`
    /// never would.
    fn membership(&mut self, quoted_column: &str, data: &Value) -> Result<String, FilterError> {
        let values = data
            .as_array()
            .ok_or_else(|| FilterError::InvalidOperatorData("IN requires array".to_string()))?;

        let includes_null = values.iter().any(Value::is_null);
        let concrete: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
        if concrete.iter().any(|v| v.is_array() || v.is_object()) {
            return Err(FilterError::InvalidOperatorData("IN members must be scalars".to_string()));
        }

        let list = if concrete.is_empty() {
            None
        } else {
            let params: Vec<String> = concrete.into_iter().map(|v| self.param(v.clone())).collect();
            Some(params.join(", "))
        };

        Ok(match (list, includes_null) {
            (None, false) => "1=0".to_string(),
            (None, true) => format!("{} IS NULL", quoted_column),
            (Some(list), false) => format!("{} IN ({})", quoted_column, list),
            (Some(list), true) => format!("({} IN ({}) OR {} IS NULL)", quoted_column, list, quoted_column),
        })
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.starting_param_index + self.param_values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_and_null() {
        let (sql, params) = FilterWhere::generate(&json!({ "is_admin": true, "subscription_status": null }), 0).unwrap();
        assert_eq!(sql, "\"is_admin\" = $1 AND \"subscription_status\" IS NULL");
        assert_eq!(params, vec![json!(true)]);
    }

    #[test]
    fn nested_groups_number_params_sequentially() {
        let where_data = json!({
            "$and": [
                { "role": { "$in": ["OWNER", "ADMIN"] } },
                { "email": { "$ilike": "%a%" } }
            ],
            "username": "bob"
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert_eq!(
            sql,
            "((\"role\" IN ($1, $2)) AND (\"email\" ILIKE $3)) AND \"username\" = $4"
        );
        assert_eq!(params, vec![json!("OWNER"), json!("ADMIN"), json!("%a%"), json!("bob")]);
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let (sql, _) = FilterWhere::generate(&json!({ "id": "x" }), 3).unwrap();
        assert_eq!(sql, "\"id\" = $4");
    }

    #[test]
    fn in_with_null_member() {
        let (sql, params) = FilterWhere::generate(&json!({ "s": { "$in": ["active", null] } }), 0).unwrap();
        assert_eq!(sql, "(\"s\" IN ($1) OR \"s\" IS NULL)");
        assert_eq!(params, vec![json!("active")]);

        let (sql, params) = FilterWhere::generate(&json!({ "s": { "$in": [null] } }), 0).unwrap();
        assert_eq!(sql, "\"s\" IS NULL");
        assert!(params.is_empty());

        let (sql, _) = FilterWhere::generate(&json!({ "s": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
    }

    #[test]
    fn only_the_listing_operators_compile() {
        for op in ["$ne", "$gt", "$lte", "$like", "$nin"] {
            assert_eq!(
                FilterWhere::generate(&json!({ "role": { op: "VIEWER" } }), 0),
                Err(FilterError::UnsupportedOperator(op.to_string()))
            );
        }
        for group in ["$or", "$not"] {
            assert_eq!(
                FilterWhere::generate(&json!({ group: [{ "role": "OWNER" }] }), 0),
                Err(FilterError::UnsupportedOperator(group.to_string()))
            );
        }

        let (sql, _) = FilterWhere::generate(&json!({ "$and": [] }), 0).unwrap();
        assert_eq!(sql, "1=1");
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            FilterWhere::generate(&json!({ "role": { "$regex": "x" } }), 0),
            Err(FilterError::UnsupportedOperator("$regex".to_string()))
        );
        assert!(matches!(
            FilterWhere::generate(&json!({ "bad name": 1 }), 0),
            Err(FilterError::InvalidColumn(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "email": { "$ilike": 5 } }), 0),
            Err(FilterError::InvalidOperatorData(_))
        ));
        assert!(FilterWhere::validate(&json!("1=1; DROP TABLE users")).is_err());
    }

    #[test]
    fn rejects_deep_nesting() {
        let mut where_data = json!({ "id": "x" });
        for _ in 0..=MAX_NESTED_DEPTH {
            where_data = json!({ "$and": [where_data] });
        }
        assert_eq!(
            FilterWhere::generate(&where_data, 0),
            Err(FilterError::NestingTooDeep(MAX_NESTED_DEPTH))
        );
    }
}
