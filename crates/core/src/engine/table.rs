//! A single in-memory table and its item operations.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use super::condition::{check_expected, evaluate};
use super::update::{apply_updates, reject_key_updates};
use crate::error::{DynamockError, Result};
use crate::model::{
    AttributeAction, AttributeValue, BillingMode, BillingModeSummary, Condition, ConsumedCapacity,
    CreateTableRequest, DeleteItemRequest, DeleteItemResponse, GetItemRequest, GetItemResponse,
    Item, KeyType, LocalSecondaryIndexDescription, ProvisionedThroughput,
    ProvisionedThroughputDescription, PutItemRequest, PutItemResponse, QueryRequest,
    QueryResponse, ReturnConsumedCapacity, ReturnValues, ScalarAttributeType, ScanRequest,
    ScanResponse, Select, TableDescription, TableStatus, UpdateItemRequest, UpdateItemResponse,
    UpdateTableRequest,
};

/// A key attribute resolved from the key schema and attribute definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: ScalarAttributeType,
}

/// Identity of a stored item: canonical hash and optional range key strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub hash: String,
    pub range: Option<String>,
}

#[derive(Debug, Clone)]
struct LocalIndex {
    name: String,
    range_key: KeyAttribute,
}

/// An in-memory table.
///
/// Items are kept in insertion order; `Query` and `Scan` walk that order.
#[derive(Debug, Clone)]
pub struct Table {
    description: TableDescription,
    hash_key: KeyAttribute,
    range_key: Option<KeyAttribute>,
    local_indexes: Vec<LocalIndex>,
    items: HashMap<ItemKey, Item>,
    insert_order: Vec<ItemKey>,
    decreases_day: Option<NaiveDate>,
}

impl Table {
    /// Builds a table from a validated `CreateTable` request.
    pub fn new(request: &CreateTableRequest, now: DateTime<Utc>) -> Result<Self> {
        let resolve = |name: &str| -> Result<KeyAttribute> {
            request
                .attribute_definitions
                .iter()
                .find(|def| def.attribute_name == name)
                .map(|def| KeyAttribute {
                    name: def.attribute_name.clone(),
                    attribute_type: def.attribute_type,
                })
                .ok_or_else(|| {
                    DynamockError::validation(format!(
                        "One or more parameter values were invalid: Some index key attributes are not defined in AttributeDefinitions. Keys: [{}]",
                        name
                    ))
                })
        };

        let hash_elements: Vec<_> = request
            .key_schema
            .iter()
            .filter(|el| el.key_type == KeyType::Hash)
            .collect();
        let range_elements: Vec<_> = request
            .key_schema
            .iter()
            .filter(|el| el.key_type == KeyType::Range)
            .collect();
        if hash_elements.len() != 1 || range_elements.len() > 1 {
            return Err(DynamockError::validation(
                "1 validation error detected: KeySchema must contain exactly one HASH element and at most one RANGE element",
            ));
        }

        let hash_key = resolve(&hash_elements[0].attribute_name)?;
        let range_key = range_elements
            .first()
            .map(|el| resolve(&el.attribute_name))
            .transpose()?;

        let mut local_indexes = Vec::with_capacity(request.local_secondary_indexes.len());
        let mut index_descriptions = Vec::with_capacity(request.local_secondary_indexes.len());
        for index in &request.local_secondary_indexes {
            let index_hash = index.key_schema.iter().find(|el| el.key_type == KeyType::Hash);
            let index_range = index.key_schema.iter().find(|el| el.key_type == KeyType::Range);
            let (Some(index_hash), Some(index_range)) = (index_hash, index_range) else {
                return Err(DynamockError::validation(format!(
                    "One or more parameter values were invalid: Local secondary index {} must have a HASH and a RANGE key",
                    index.index_name
                )));
            };
            if index_hash.attribute_name != hash_key.name {
                return Err(DynamockError::validation(format!(
                    "One or more parameter values were invalid: Index KeySchema does not have the same leading hash key as table KeySchema for index: {}",
                    index.index_name
                )));
            }
            local_indexes.push(LocalIndex {
                name: index.index_name.clone(),
                range_key: resolve(&index_range.attribute_name)?,
            });
            index_descriptions.push(LocalSecondaryIndexDescription {
                index_name: index.index_name.clone(),
                key_schema: index.key_schema.clone(),
                projection: index.projection.clone(),
                index_size_bytes: 0,
                item_count: 0,
            });
        }

        let billing_mode = request.billing_mode.unwrap_or_default();
        let throughput = match (billing_mode, request.provisioned_throughput) {
            (BillingMode::Provisioned, Some(throughput)) => {
                validate_throughput(&throughput)?;
                throughput
            }
            (BillingMode::Provisioned, None) => {
                return Err(DynamockError::validation(
                    "One or more parameter values were invalid: ReadCapacityUnits and WriteCapacityUnits must both be specified when BillingMode is PROVISIONED",
                ))
            }
            (BillingMode::PayPerRequest, _) => ProvisionedThroughput::new(0, 0),
        };

        let description = TableDescription {
            table_name: request.table_name.clone(),
            table_status: TableStatus::Active,
            attribute_definitions: request.attribute_definitions.clone(),
            key_schema: request.key_schema.clone(),
            local_secondary_indexes: index_descriptions,
            provisioned_throughput: ProvisionedThroughputDescription {
                last_increase_date_time: Some(now),
                last_decrease_date_time: None,
                number_of_decreases_today: 0,
                read_capacity_units: throughput.read_capacity_units,
                write_capacity_units: throughput.write_capacity_units,
            },
            billing_mode_summary: request
                .billing_mode
                .map(|billing_mode| BillingModeSummary { billing_mode }),
            creation_date_time: now,
            item_count: 0,
            table_size_bytes: 0,
        };

        Ok(Self {
            description,
            hash_key,
            range_key,
            local_indexes,
            items: HashMap::new(),
            insert_order: Vec::new(),
            decreases_day: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.description.table_name
    }

    pub fn hash_key(&self) -> &KeyAttribute {
        &self.hash_key
    }

    pub fn range_key(&self) -> Option<&KeyAttribute> {
        self.range_key.as_ref()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn stored(&self, key: &ItemKey) -> Option<&Item> {
        self.items.get(key)
    }

    /// Current description with live item count and size.
    ///
    /// `NumberOfDecreasesToday` reads as zero once `now` falls on a later UTC
    /// day than the last decrease.
    pub fn describe(&self, now: DateTime<Utc>) -> TableDescription {
        let mut description = self.description.clone();
        if self.decreases_day != Some(now.date_naive()) {
            description.provisioned_throughput.number_of_decreases_today = 0;
        }
        description.item_count = self.items.len() as i64;
        description.table_size_bytes = self.items.values().map(item_size).sum::<usize>() as i64;

        for (index, index_description) in self
            .local_indexes
            .iter()
            .zip(description.local_secondary_indexes.iter_mut())
        {
            let indexed: Vec<&Item> = self
                .items
                .values()
                .filter(|item| item.contains_key(&index.range_key.name))
                .collect();
            index_description.item_count = indexed.len() as i64;
            index_description.index_size_bytes =
                indexed.iter().map(|item| item_size(item)).sum::<usize>() as i64;
        }
        description
    }

    /// Applies new provisioned throughput and updates the change bookkeeping.
    ///
    /// `NumberOfDecreasesToday` resets the first time the table is updated on
    /// a new UTC day.
    pub fn update_throughput(
        &mut self,
        request: &UpdateTableRequest,
        now: DateTime<Utc>,
    ) -> Result<TableDescription> {
        let Some(requested) = request.provisioned_throughput else {
            return Err(DynamockError::validation(
                "At least one of ProvisionedThroughput, BillingMode, UpdateStreamEnabled, GlobalSecondaryIndexUpdates or SSESpecification or ReplicaUpdates is required",
            ));
        };
        if self
            .description
            .billing_mode_summary
            .is_some_and(|summary| summary.billing_mode == BillingMode::PayPerRequest)
        {
            return Err(DynamockError::validation(
                "One or more parameter values were invalid: Neither ReadCapacityUnits nor WriteCapacityUnits can be specified when BillingMode is PAY_PER_REQUEST",
            ));
        }
        validate_throughput(&requested)?;

        let today = now.date_naive();
        let throughput = &mut self.description.provisioned_throughput;
        if self.decreases_day != Some(today) {
            self.decreases_day = Some(today);
            throughput.number_of_decreases_today = 0;
        }

        let increased = requested.read_capacity_units > throughput.read_capacity_units
            || requested.write_capacity_units > throughput.write_capacity_units;
        let decreased = requested.read_capacity_units < throughput.read_capacity_units
            || requested.write_capacity_units < throughput.write_capacity_units;

        if increased {
            throughput.last_increase_date_time = Some(now);
        }
        if decreased {
            throughput.last_decrease_date_time = Some(now);
            throughput.number_of_decreases_today += 1;
        }
        throughput.read_capacity_units = requested.read_capacity_units;
        throughput.write_capacity_units = requested.write_capacity_units;

        Ok(self.describe(now))
    }

    /// Marks the table as being deleted and returns its final description.
    pub fn into_deleted_description(self, now: DateTime<Utc>) -> TableDescription {
        let mut description = self.describe(now);
        description.table_status = TableStatus::Deleting;
        description
    }

    // ========================================================================
    // Keys
    // ========================================================================

    fn key_names(&self) -> Vec<&str> {
        let mut names = vec![self.hash_key.name.as_str()];
        if let Some(range) = &self.range_key {
            names.push(range.name.as_str());
        }
        names
    }

    /// Extracts the primary key from a full item (extra attributes allowed).
    pub fn key_from_item(&self, item: &Item) -> Result<ItemKey> {
        let hash = key_part(item, &self.hash_key, "Missing the key")?;
        let range = self
            .range_key
            .as_ref()
            .map(|range| key_part(item, range, "Missing the key"))
            .transpose()?;
        Ok(ItemKey { hash, range })
    }

    /// Extracts the primary key from a `Key` map, which must name exactly the
    /// key attributes.
    pub fn key_from_key(&self, key: &Item) -> Result<ItemKey> {
        if key.len() != self.key_names().len() {
            return Err(DynamockError::validation(
                "The provided key element does not match the schema",
            ));
        }
        let hash = key_part(key, &self.hash_key, "The provided key element does not match the schema")?;
        let range = self
            .range_key
            .as_ref()
            .map(|range| key_part(key, range, "The provided key element does not match the schema"))
            .transpose()?;
        Ok(ItemKey { hash, range })
    }

    fn key_attributes(&self, item: &Item) -> Item {
        self.key_names()
            .into_iter()
            .filter_map(|name| item.get(name).map(|v| (name.to_string(), v.clone())))
            .collect()
    }

    // ========================================================================
    // Item operations
    // ========================================================================

    pub fn put_item(&mut self, request: &PutItemRequest) -> Result<PutItemResponse> {
        request.item.values().try_for_each(AttributeValue::validate)?;
        let key = self.key_from_item(&request.item)?;
        let current = self.items.get(&key);
        check_expected(&request.expected, current)?;

        let old = self.items.insert(key.clone(), request.item.clone());
        if old.is_none() {
            self.insert_order.push(key);
        }

        let updated: Vec<&str> = request.item.keys().map(String::as_str).collect();
        Ok(PutItemResponse {
            attributes: select_return_values(
                request.return_values,
                old.as_ref(),
                Some(&request.item),
                &updated,
            ),
            consumed_capacity: self.consumed(request.return_consumed_capacity, 1.0),
        })
    }

    pub fn get_item(&self, request: &GetItemRequest) -> Result<GetItemResponse> {
        let key = self.key_from_key(&request.key)?;
        let item = self
            .items
            .get(&key)
            .map(|item| project(item, &request.attributes_to_get));

        Ok(GetItemResponse {
            item,
            consumed_capacity: self.consumed(
                request.return_consumed_capacity,
                read_units(request.consistent_read),
            ),
        })
    }

    /// Removes an item. Deleting a key that is not stored succeeds.
    pub fn delete_item(&mut self, request: &DeleteItemRequest) -> Result<DeleteItemResponse> {
        let key = self.key_from_key(&request.key)?;
        check_expected(&request.expected, self.items.get(&key))?;

        let old = self.items.remove(&key);
        if old.is_some() {
            self.insert_order.retain(|k| k != &key);
        }

        Ok(DeleteItemResponse {
            attributes: select_return_values(request.return_values, old.as_ref(), None, &[]),
            consumed_capacity: self.consumed(request.return_consumed_capacity, 1.0),
        })
    }

    /// Updates attributes of an item, creating it from the key when missing.
    pub fn update_item(&mut self, request: &UpdateItemRequest) -> Result<UpdateItemResponse> {
        request.key.values().try_for_each(AttributeValue::validate)?;
        let key = self.key_from_key(&request.key)?;
        reject_key_updates(&request.attribute_updates, &self.key_names())?;
        let current = self.items.get(&key).cloned();
        check_expected(&request.expected, current.as_ref())?;

        let only_deletes = request
            .attribute_updates
            .values()
            .all(|update| update.action == AttributeAction::Delete);
        if current.is_none() && only_deletes {
            return Ok(UpdateItemResponse {
                attributes: None,
                consumed_capacity: self.consumed(request.return_consumed_capacity, 1.0),
            });
        }

        let mut updated_item = current
            .clone()
            .unwrap_or_else(|| self.key_attributes(&request.key));
        apply_updates(&mut updated_item, &request.attribute_updates, &self.key_names())?;

        if current.is_none() {
            self.insert_order.push(key.clone());
        }
        self.items.insert(key, updated_item.clone());

        let updated: Vec<&str> = request.attribute_updates.keys().map(String::as_str).collect();
        Ok(UpdateItemResponse {
            attributes: select_return_values(
                request.return_values,
                current.as_ref(),
                Some(&updated_item),
                &updated,
            ),
            consumed_capacity: self.consumed(request.return_consumed_capacity, 1.0),
        })
    }

    // ========================================================================
    // Query and scan
    // ========================================================================

    /// Keys in walk order, starting strictly after `exclusive_start` if given.
    fn ordered_keys(&self, exclusive_start: Option<&Item>, forward: bool) -> Result<Vec<&ItemKey>> {
        let mut order: Vec<&ItemKey> = self.insert_order.iter().collect();
        if !forward {
            order.reverse();
        }
        let Some(start) = exclusive_start else {
            return Ok(order);
        };
        let start_key = self.key_from_item(start)?;
        let begin = order
            .iter()
            .position(|k| **k == start_key)
            .map_or(order.len(), |p| p + 1);
        Ok(order.split_off(begin))
    }

    /// Runs a query over key conditions.
    ///
    /// Any comparison operator is accepted on the hash key, not just `EQ`.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let range_key = match &request.index_name {
            None => self.range_key.as_ref(),
            Some(index_name) => Some(
                &self
                    .local_indexes
                    .iter()
                    .find(|index| &index.name == index_name)
                    .ok_or_else(|| {
                        DynamockError::validation(format!(
                            "The table does not have the specified index: {}",
                            index_name
                        ))
                    })?
                    .range_key,
            ),
        };

        let mut hash_condition = None;
        let mut range_condition = None;
        for (name, condition) in &request.key_conditions {
            if *name == self.hash_key.name {
                check_key_condition_types(condition, &self.hash_key)?;
                hash_condition = Some(condition);
            } else if let Some(range) = range_key.filter(|range| range.name == *name) {
                check_key_condition_types(condition, range)?;
                range_condition = Some(condition);
            } else {
                return Err(DynamockError::validation(format!(
                    "Query condition missed key schema element: {}",
                    name
                )));
            }
        }
        let Some(hash_condition) = hash_condition else {
            return Err(DynamockError::validation(format!(
                "Query condition missed key schema element: {}",
                self.hash_key.name
            )));
        };

        let limit = validate_limit(request.limit)?;
        let forward = request.scan_index_forward.unwrap_or(true);
        let mut matched = Vec::new();
        for key in self.ordered_keys(request.exclusive_start_key.as_ref(), forward)? {
            let item = &self.items[key];
            if !evaluate(hash_condition, item.get(&self.hash_key.name))? {
                continue;
            }
            if let Some(range) = range_key {
                if request.index_name.is_some() && !item.contains_key(&range.name) {
                    continue;
                }
                if let Some(condition) = range_condition {
                    if !evaluate(condition, item.get(&range.name))? {
                        continue;
                    }
                }
            }
            matched.push(item);
        }

        let mut last_evaluated_key = None;
        if let Some(limit) = limit {
            if matched.len() > limit {
                matched.truncate(limit);
                last_evaluated_key = matched.last().map(|item| {
                    let mut key = self.key_attributes(item);
                    if let (Some(_), Some(range)) = (&request.index_name, range_key) {
                        if let Some(value) = item.get(&range.name) {
                            key.insert(range.name.clone(), value.clone());
                        }
                    }
                    key
                });
            }
        }

        let count = matched.len() as i64;
        Ok(QueryResponse {
            items: select_items(request.select, &matched, &request.attributes_to_get),
            count,
            scanned_count: count,
            last_evaluated_key,
            consumed_capacity: self.consumed(
                request.return_consumed_capacity,
                read_units(request.consistent_read) * (count.max(1) as f64),
            ),
        })
    }

    /// Walks every item, applying `ScanFilter` after `Limit` as DynamoDB does.
    pub fn scan(&self, request: &ScanRequest) -> Result<ScanResponse> {
        let limit = validate_limit(request.limit)?;
        let keys = self.ordered_keys(request.exclusive_start_key.as_ref(), true)?;

        let mut matched = Vec::new();
        let mut scanned = 0usize;
        let mut last_evaluated_key = None;
        for (position, key) in keys.iter().enumerate() {
            let item = &self.items[*key];
            scanned += 1;
            if matches_filter(&request.scan_filter, item)? {
                matched.push(item);
            }
            if limit.is_some_and(|limit| scanned >= limit) && position + 1 < keys.len() {
                last_evaluated_key = Some(self.key_attributes(item));
                break;
            }
        }

        let count = matched.len() as i64;
        Ok(ScanResponse {
            items: select_items(request.select, &matched, &request.attributes_to_get),
            count,
            scanned_count: scanned as i64,
            last_evaluated_key,
            consumed_capacity: self.consumed(
                request.return_consumed_capacity,
                read_units(request.consistent_read) * (scanned.max(1) as f64),
            ),
        })
    }

    fn consumed(&self, mode: ReturnConsumedCapacity, units: f64) -> Option<ConsumedCapacity> {
        match mode {
            ReturnConsumedCapacity::None => None,
            ReturnConsumedCapacity::Total | ReturnConsumedCapacity::Indexes => {
                Some(ConsumedCapacity {
                    table_name: self.name().to_string(),
                    capacity_units: units,
                })
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn key_part(item: &Item, key: &KeyAttribute, message: &str) -> Result<String> {
    let value = item.get(&key.name).ok_or_else(|| {
        DynamockError::validation(format!(
            "One or more parameter values were invalid: {} {}",
            message, key.name
        ))
    })?;
    if value.scalar_type() != Some(key.attribute_type) {
        return Err(DynamockError::validation(format!(
            "One or more parameter values were invalid: Type mismatch for key {} expected: {} actual: {}",
            key.name,
            key.attribute_type.as_str(),
            value.type_tag()
        )));
    }
    value.validate()?;
    value.key_string().ok_or_else(|| {
        DynamockError::validation(format!(
            "One or more parameter values were invalid: Invalid key value for {}",
            key.name
        ))
    })
}

fn check_key_condition_types(condition: &Condition, key: &KeyAttribute) -> Result<()> {
    let mismatched = condition
        .attribute_value_list
        .iter()
        .any(|value| value.scalar_type() != Some(key.attribute_type));
    if mismatched {
        return Err(DynamockError::validation(format!(
            "One or more parameter values were invalid: Condition parameter type does not match schema type for key {}",
            key.name
        )));
    }
    Ok(())
}

fn matches_filter(filter: &HashMap<String, Condition>, item: &Item) -> Result<bool> {
    for (name, condition) in filter {
        if !evaluate(condition, item.get(name))? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn validate_limit(limit: Option<i64>) -> Result<Option<usize>> {
    match limit {
        None => Ok(None),
        Some(limit) if limit >= 1 => Ok(Some(limit as usize)),
        Some(limit) => Err(DynamockError::validation(format!(
            "1 validation error detected: Value '{}' at 'limit' failed to satisfy constraint: Member must have value greater than or equal to 1",
            limit
        ))),
    }
}

fn validate_throughput(throughput: &ProvisionedThroughput) -> Result<()> {
    if throughput.read_capacity_units < 1 || throughput.write_capacity_units < 1 {
        return Err(DynamockError::validation(
            "One or more parameter values were invalid: Provisioned throughput units must be at least 1",
        ));
    }
    Ok(())
}

fn read_units(consistent: bool) -> f64 {
    if consistent {
        1.0
    } else {
        0.5
    }
}

fn item_size(item: &Item) -> usize {
    item.iter().map(|(name, value)| name.len() + value.size()).sum()
}

/// Copies only the named attributes; an empty list keeps everything.
pub(crate) fn project(item: &Item, attributes: &[String]) -> Item {
    if attributes.is_empty() {
        return item.clone();
    }
    attributes
        .iter()
        .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}

fn select_items(select: Select, items: &[&Item], attributes: &[String]) -> Option<Vec<Item>> {
    match select {
        Select::Count => None,
        _ => Some(items.iter().map(|item| project(item, attributes)).collect()),
    }
}

fn select_return_values(
    return_values: ReturnValues,
    old: Option<&Item>,
    new: Option<&Item>,
    updated: &[&str],
) -> Option<Item> {
    let only_updated = |item: &Item| -> Item {
        item.iter()
            .filter(|(name, _)| updated.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    };
    let selected = match return_values {
        ReturnValues::None => None,
        ReturnValues::AllOld => old.cloned(),
        ReturnValues::UpdatedOld => old.map(only_updated),
        ReturnValues::AllNew => new.cloned(),
        ReturnValues::UpdatedNew => new.map(only_updated),
    };
    selected.filter(|item| !item.is_empty())
}
