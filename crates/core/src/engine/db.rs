//! The set of tables held by one mock instance.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use chrono::{DateTime, Utc};

use super::table::{project, Table};
use crate::error::{DynamockError, Result};
use crate::model::{
    BatchGetItemRequest, BatchGetItemResponse, BatchWriteItemRequest, BatchWriteItemResponse,
    ConsumedCapacity, CreateTableRequest, CreateTableResponse, DeleteItemRequest,
    DeleteItemResponse, DeleteTableRequest, DeleteTableResponse, DescribeTableRequest,
    DescribeTableResponse, GetItemRequest, GetItemResponse, ListTablesRequest,
    ListTablesResponse, PutItemRequest, PutItemResponse, QueryRequest, QueryResponse,
    ReturnConsumedCapacity, ScanRequest, ScanResponse, UpdateItemRequest, UpdateItemResponse,
    UpdateTableRequest, UpdateTableResponse,
};

/// Page size used by `ListTables` when the request gives no `Limit`.
pub const DEFAULT_LIST_TABLES_LIMIT: usize = 100;

const MAX_BATCH_WRITE: usize = 25;
const MAX_BATCH_GET: usize = 100;

/// All tables of a mock instance, keyed and listed by name.
#[derive(Debug, Clone)]
pub struct Database {
    tables: BTreeMap<String, Table>,
    list_tables_limit: usize,
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DEFAULT_LIST_TABLES_LIMIT)
    }
}

impl Database {
    /// Creates an empty database whose `ListTables` pages hold at most
    /// `list_tables_limit` names.
    pub fn new(list_tables_limit: usize) -> Self {
        Self {
            tables: BTreeMap::new(),
            list_tables_limit: list_tables_limit.max(1),
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DynamockError::table_not_found(name))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DynamockError::table_not_found(name))
    }

    // ========================================================================
    // Table operations
    // ========================================================================

    pub fn create_table(
        &mut self,
        request: &CreateTableRequest,
        now: DateTime<Utc>,
    ) -> Result<CreateTableResponse> {
        validate_table_name(&request.table_name)?;
        if self.tables.contains_key(&request.table_name) {
            return Err(DynamockError::ResourceInUse {
                table_name: request.table_name.clone(),
            });
        }

        let table = Table::new(request, now)?;
        let table_description = table.describe(now);
        self.tables.insert(request.table_name.clone(), table);
        tracing::info!(table = %request.table_name, "table created");

        Ok(CreateTableResponse { table_description })
    }

    pub fn describe_table(
        &self,
        request: &DescribeTableRequest,
        now: DateTime<Utc>,
    ) -> Result<DescribeTableResponse> {
        Ok(DescribeTableResponse {
            table: self.table(&request.table_name)?.describe(now),
        })
    }

    pub fn delete_table(
        &mut self,
        request: &DeleteTableRequest,
        now: DateTime<Utc>,
    ) -> Result<DeleteTableResponse> {
        let table = self
            .tables
            .remove(&request.table_name)
            .ok_or_else(|| DynamockError::table_not_found(&request.table_name))?;
        tracing::info!(table = %request.table_name, "table deleted");

        Ok(DeleteTableResponse {
            table_description: table.into_deleted_description(now),
        })
    }

    pub fn update_table(
        &mut self,
        request: &UpdateTableRequest,
        now: DateTime<Utc>,
    ) -> Result<UpdateTableResponse> {
        let table_description = self
            .table_mut(&request.table_name)?
            .update_throughput(request, now)?;
        Ok(UpdateTableResponse { table_description })
    }

    /// Lists table names in lexicographic order, one page at a time.
    pub fn list_tables(&self, request: &ListTablesRequest) -> Result<ListTablesResponse> {
        let limit = match request.limit {
            None => self.list_tables_limit,
            Some(limit) if limit >= 1 && limit as usize <= self.list_tables_limit => {
                limit as usize
            }
            Some(limit) => {
                return Err(DynamockError::validation(format!(
                    "1 validation error detected: Value '{}' at 'limit' failed to satisfy constraint: Member must have value less than or equal to {} and greater than or equal to 1",
                    limit, self.list_tables_limit
                )))
            }
        };

        let lower = match &request.exclusive_start_table_name {
            Some(name) => Bound::Excluded(name.clone()),
            None => Bound::Unbounded,
        };
        let mut remaining = self
            .tables
            .range((lower, Bound::Unbounded))
            .map(|(name, _)| name.clone());

        let table_names: Vec<String> = remaining.by_ref().take(limit).collect();
        let last_evaluated_table_name = if remaining.next().is_some() {
            table_names.last().cloned()
        } else {
            None
        };

        Ok(ListTablesResponse {
            table_names,
            last_evaluated_table_name,
        })
    }

    // ========================================================================
    // Item operations
    // ========================================================================

    pub fn put_item(&mut self, request: &PutItemRequest) -> Result<PutItemResponse> {
        self.table_mut(&request.table_name)?.put_item(request)
    }

    pub fn get_item(&self, request: &GetItemRequest) -> Result<GetItemResponse> {
        self.table(&request.table_name)?.get_item(request)
    }

    pub fn delete_item(&mut self, request: &DeleteItemRequest) -> Result<DeleteItemResponse> {
        self.table_mut(&request.table_name)?.delete_item(request)
    }

    pub fn update_item(&mut self, request: &UpdateItemRequest) -> Result<UpdateItemResponse> {
        self.table_mut(&request.table_name)?.update_item(request)
    }

    pub fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.table(&request.table_name)?.query(request)
    }

    pub fn scan(&self, request: &ScanRequest) -> Result<ScanResponse> {
        self.table(&request.table_name)?.scan(request)
    }

    // ========================================================================
    // Batch operations
    // ========================================================================

    /// Reads many keys across tables. Missing items are simply left out.
    pub fn batch_get_item(&self, request: &BatchGetItemRequest) -> Result<BatchGetItemResponse> {
        let total: usize = request.request_items.values().map(|k| k.keys.len()).sum();
        if request.request_items.is_empty() || total == 0 {
            return Err(DynamockError::validation(
                "1 validation error detected: Value at 'requestItems' failed to satisfy constraint: Member must have length greater than or equal to 1",
            ));
        }
        if total > MAX_BATCH_GET {
            return Err(DynamockError::validation(format!(
                "Too many items requested for the BatchGetItem call: {} (max {})",
                total, MAX_BATCH_GET
            )));
        }

        let mut responses = HashMap::new();
        let mut consumed_capacity = Vec::new();
        for (table_name, keys_and_attributes) in &request.request_items {
            let table = self.table(table_name)?;
            let mut found = Vec::new();
            for key in &keys_and_attributes.keys {
                let item_key = table.key_from_key(key)?;
                if let Some(item) = table.stored(&item_key) {
                    found.push(project(item, &keys_and_attributes.attributes_to_get));
                }
            }
            if request.return_consumed_capacity != ReturnConsumedCapacity::None {
                let per_read = if keys_and_attributes.consistent_read {
                    1.0
                } else {
                    0.5
                };
                consumed_capacity.push(ConsumedCapacity {
                    table_name: table_name.clone(),
                    capacity_units: per_read * keys_and_attributes.keys.len() as f64,
                });
            }
            responses.insert(table_name.clone(), found);
        }

        Ok(BatchGetItemResponse {
            responses,
            unprocessed_keys: HashMap::new(),
            consumed_capacity,
        })
    }

    /// Applies puts and deletes across tables.
    ///
    /// Every request is validated before the first write, so a bad entry
    /// leaves all tables untouched.
    pub fn batch_write_item(
        &mut self,
        request: &BatchWriteItemRequest,
    ) -> Result<BatchWriteItemResponse> {
        let total: usize = request.request_items.values().map(Vec::len).sum();
        if total == 0 {
            return Err(DynamockError::validation(
                "1 validation error detected: Value at 'requestItems' failed to satisfy constraint: Member must have length greater than or equal to 1",
            ));
        }
        if total > MAX_BATCH_WRITE {
            return Err(DynamockError::validation(format!(
                "1 validation error detected: Value at 'requestItems' failed to satisfy constraint: Member must have length less than or equal to {}",
                MAX_BATCH_WRITE
            )));
        }

        for (table_name, writes) in &request.request_items {
            let table = self.table(table_name)?;
            let mut seen = HashSet::with_capacity(writes.len());
            for write in writes {
                let key = match (&write.put_request, &write.delete_request) {
                    (Some(put), None) => {
                        put.item.values().try_for_each(|v| v.validate())?;
                        table.key_from_item(&put.item)?
                    }
                    (None, Some(delete)) => table.key_from_key(&delete.key)?,
                    _ => {
                        return Err(DynamockError::validation(
                            "Supplied AttributeValue has more than one datatypes set, must contain exactly one of the supported datatypes",
                        ))
                    }
                };
                if !seen.insert(key) {
                    return Err(DynamockError::validation(
                        "Provided list of item keys contains duplicates",
                    ));
                }
            }
        }

        let mut consumed_capacity = Vec::new();
        for (table_name, writes) in &request.request_items {
            let table = self.table_mut(table_name)?;
            for write in writes {
                if let Some(put) = &write.put_request {
                    table.put_item(&PutItemRequest {
                        table_name: table_name.clone(),
                        item: put.item.clone(),
                        ..Default::default()
                    })?;
                } else if let Some(delete) = &write.delete_request {
                    table.delete_item(&DeleteItemRequest {
                        table_name: table_name.clone(),
                        key: delete.key.clone(),
                        ..Default::default()
                    })?;
                }
            }
            if request.return_consumed_capacity != ReturnConsumedCapacity::None {
                consumed_capacity.push(ConsumedCapacity {
                    table_name: table_name.clone(),
                    capacity_units: writes.len() as f64,
                });
            }
        }

        Ok(BatchWriteItemResponse {
            unprocessed_items: HashMap::new(),
            consumed_capacity,
        })
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if (3..=255).contains(&name.len()) && valid_chars {
        Ok(())
    } else {
        Err(DynamockError::validation(format!(
            "1 validation error detected: Value '{}' at 'tableName' failed to satisfy constraint: Member must satisfy regular expression pattern: [a-zA-Z0-9_.-]+ and have length between 3 and 255",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AttributeDefinition, AttributeValue, DeleteRequest, Item, KeySchemaElement,
        KeysAndAttributes, ProvisionedThroughput, PutRequest, ScalarAttributeType, TableStatus,
        WriteRequest,
    };

    fn create_request(name: &str) -> CreateTableRequest {
        CreateTableRequest {
            table_name: name.to_string(),
            attribute_definitions: vec![
                AttributeDefinition::new("foo", ScalarAttributeType::S),
                AttributeDefinition::new("id", ScalarAttributeType::S),
            ],
            key_schema: vec![KeySchemaElement::hash("id")],
            provisioned_throughput: Some(ProvisionedThroughput::new(5, 5)),
            billing_mode: None,
            local_secondary_indexes: vec![],
        }
    }

    fn create_table(db: &mut Database, name: &str) {
        db.create_table(&create_request(name), Utc::now()).unwrap();
    }

    fn database_with(names: &[&str]) -> Database {
        let mut db = Database::default();
        for name in names {
            create_table(&mut db, name);
        }
        db
    }

    fn key(id: &str) -> Item {
        HashMap::from([("id".to_string(), AttributeValue::S(id.to_string()))])
    }

    #[test]
    fn test_create_table() {
        let mut db = Database::default();
        let response = db.create_table(&create_request("bar"), Utc::now()).unwrap();
        assert_eq!(
            response.table_description.attribute_definitions[0].attribute_name,
            "foo"
        );
        assert_eq!(response.table_description.table_status, TableStatus::Active);
        assert_eq!(db.table_count(), 1);
    }

    #[test]
    fn test_create_duplicate_table_is_in_use() {
        let mut db = database_with(&["bar"]);
        let result = db.create_table(&create_request("bar"), Utc::now());
        assert_eq!(
            result.unwrap_err(),
            DynamockError::ResourceInUse {
                table_name: "bar".to_string()
            }
        );
    }

    #[test]
    fn test_create_table_validates_name() {
        let mut db = Database::default();
        for name in ["ab", "has space", "slash/name"] {
            let result = db.create_table(&create_request(name), Utc::now());
            assert!(matches!(result, Err(DynamockError::Validation(_))), "{}", name);
        }
        assert_eq!(db.table_count(), 0);
    }

    #[test]
    fn test_describe_table() {
        let db = database_with(&["bar"]);
        let response = db
            .describe_table(
                &DescribeTableRequest {
                    table_name: "bar".to_string(),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(response.table.attribute_definitions[0].attribute_name, "foo");

        let missing = db.describe_table(
            &DescribeTableRequest {
                table_name: "nope".to_string(),
            },
            Utc::now(),
        );
        assert_eq!(missing.unwrap_err(), DynamockError::table_not_found("nope"));
    }

    #[test]
    fn test_list_tables_sorted() {
        let db = database_with(&["bar", "baz", "boz", "bor", "bez"]);
        let response = db.list_tables(&ListTablesRequest::default()).unwrap();
        assert_eq!(response.table_names, vec!["bar", "baz", "bez", "bor", "boz"]);
        assert_eq!(response.last_evaluated_table_name, None);
    }

    #[test]
    fn test_list_tables_pages() {
        let db = database_with(&["bar", "baz", "boz", "bor", "bez"]);

        let first = db
            .list_tables(&ListTablesRequest {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(first.table_names, vec!["bar", "baz"]);
        assert_eq!(first.last_evaluated_table_name.as_deref(), Some("baz"));

        let rest = db
            .list_tables(&ListTablesRequest {
                exclusive_start_table_name: first.last_evaluated_table_name,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rest.table_names, vec!["bez", "bor", "boz"]);
        assert_eq!(rest.last_evaluated_table_name, None);
    }

    #[test]
    fn test_list_tables_exact_page_has_no_cursor() {
        let db = database_with(&["bar", "baz"]);
        let response = db
            .list_tables(&ListTablesRequest {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(response.table_names.len(), 2);
        assert_eq!(response.last_evaluated_table_name, None);
    }

    #[test]
    fn test_list_tables_rejects_out_of_range_limit() {
        let db = Database::new(3);
        for limit in [0, 4] {
            let result = db.list_tables(&ListTablesRequest {
                limit: Some(limit),
                ..Default::default()
            });
            assert!(matches!(result, Err(DynamockError::Validation(_))));
        }
    }

    #[test]
    fn test_list_tables_uses_configured_page_size() {
        let mut db = Database::new(2);
        for name in ["aaa", "bbb", "ccc"] {
            create_table(&mut db, name);
        }
        let response = db.list_tables(&ListTablesRequest::default()).unwrap();
        assert_eq!(response.table_names, vec!["aaa", "bbb"]);
        assert_eq!(response.last_evaluated_table_name.as_deref(), Some("bbb"));
    }

    #[test]
    fn test_delete_table() {
        let mut db = database_with(&["bar", "baz", "boz", "bor", "bez"]);
        let response = db
            .delete_table(
                &DeleteTableRequest {
                    table_name: "baz".to_string(),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(response.table_description.table_name, "baz");
        assert_eq!(response.table_description.table_status, TableStatus::Deleting);

        let listed = db.list_tables(&ListTablesRequest::default()).unwrap();
        assert_eq!(listed.table_names, vec!["bar", "bez", "bor", "boz"]);

        let again = db.delete_table(
            &DeleteTableRequest {
                table_name: "baz".to_string(),
            },
            Utc::now(),
        );
        assert_eq!(again.unwrap_err(), DynamockError::table_not_found("baz"));
    }

    #[test]
    fn test_item_operations_on_missing_table() {
        let mut db = Database::default();
        let result = db.put_item(&PutItemRequest {
            table_name: "ghost".to_string(),
            item: key("a"),
            ..Default::default()
        });
        assert_eq!(result.unwrap_err(), DynamockError::table_not_found("ghost"));
    }

    #[test]
    fn test_batch_write_then_batch_get() {
        let mut db = database_with(&["bar", "baz"]);
        let request = BatchWriteItemRequest {
            request_items: HashMap::from([
                (
                    "bar".to_string(),
                    vec![
                        WriteRequest {
                            put_request: Some(PutRequest { item: key("1") }),
                            delete_request: None,
                        },
                        WriteRequest {
                            put_request: Some(PutRequest { item: key("2") }),
                            delete_request: None,
                        },
                    ],
                ),
                (
                    "baz".to_string(),
                    vec![WriteRequest {
                        put_request: Some(PutRequest { item: key("3") }),
                        delete_request: None,
                    }],
                ),
            ]),
            return_consumed_capacity: ReturnConsumedCapacity::Total,
        };
        let response = db.batch_write_item(&request).unwrap();
        assert!(response.unprocessed_items.is_empty());
        assert_eq!(response.consumed_capacity.len(), 2);

        let response = db
            .batch_get_item(&BatchGetItemRequest {
                request_items: HashMap::from([(
                    "bar".to_string(),
                    KeysAndAttributes {
                        keys: vec![key("1"), key("2"), key("404")],
                        ..Default::default()
                    },
                )]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(response.responses["bar"].len(), 2);
        assert!(response.unprocessed_keys.is_empty());
    }

    #[test]
    fn test_batch_write_deletes() {
        let mut db = database_with(&["bar"]);
        db.put_item(&PutItemRequest {
            table_name: "bar".to_string(),
            item: key("1"),
            ..Default::default()
        })
        .unwrap();

        db.batch_write_item(&BatchWriteItemRequest {
            request_items: HashMap::from([(
                "bar".to_string(),
                vec![WriteRequest {
                    put_request: None,
                    delete_request: Some(DeleteRequest { key: key("1") }),
                }],
            )]),
            ..Default::default()
        })
        .unwrap();

        let response = db
            .describe_table(
                &DescribeTableRequest {
                    table_name: "bar".to_string(),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(response.table.item_count, 0);
    }

    #[test]
    fn test_batch_write_is_validated_before_writing() {
        let mut db = database_with(&["bar"]);
        let request = BatchWriteItemRequest {
            request_items: HashMap::from([(
                "bar".to_string(),
                vec![
                    WriteRequest {
                        put_request: Some(PutRequest { item: key("1") }),
                        delete_request: None,
                    },
                    WriteRequest::default(),
                ],
            )]),
            ..Default::default()
        };
        assert!(matches!(
            db.batch_write_item(&request),
            Err(DynamockError::Validation(_))
        ));

        let response = db
            .describe_table(
                &DescribeTableRequest {
                    table_name: "bar".to_string(),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(response.table.item_count, 0);
    }

    #[test]
    fn test_batch_write_rejects_duplicate_keys() {
        let mut db = database_with(&["bar"]);
        let request = BatchWriteItemRequest {
            request_items: HashMap::from([(
                "bar".to_string(),
                vec![
                    WriteRequest {
                        put_request: Some(PutRequest { item: key("1") }),
                        delete_request: None,
                    },
                    WriteRequest {
                        put_request: None,
                        delete_request: Some(DeleteRequest { key: key("1") }),
                    },
                ],
            )]),
            ..Default::default()
        };
        let err = db.batch_write_item(&request).unwrap_err();
        assert!(err.to_string().contains("duplicates"));

        let response = db
            .describe_table(
                &DescribeTableRequest {
                    table_name: "bar".to_string(),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(response.table.item_count, 0);
    }

    #[test]
    fn test_batch_write_limit() {
        let mut db = database_with(&["bar"]);
        let writes = (0..26)
            .map(|i| WriteRequest {
                put_request: Some(PutRequest {
                    item: key(&i.to_string()),
                }),
                delete_request: None,
            })
            .collect();
        let result = db.batch_write_item(&BatchWriteItemRequest {
            request_items: HashMap::from([("bar".to_string(), writes)]),
            ..Default::default()
        });
        assert!(matches!(result, Err(DynamockError::Validation(_))));
    }
}
