//! Memoized remote field types.

use std::collections::HashMap;

use tracker_model::{AttributeId, CoercedValue, DataElementId, ValueType};

use crate::error::TypeCacheError;

/// Remote-declared value types of attributes and data elements, plus the
/// attribute used as the uniqueness key during conflict recovery.
///
/// Entries are filled lazily and never evicted. One cache belongs to one
/// [`Reconciler`](crate::Reconciler).
#[derive(Debug, Clone, Default)]
pub struct TypeCache {
    attribute_types: HashMap<AttributeId, ValueType>,
    data_element_types: HashMap<DataElementId, ValueType>,
    unique_attribute: Option<AttributeId>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose unique attribute is fixed up front. Attributes reported
    /// unique later never replace it.
    pub fn with_unique_attribute(attribute: AttributeId) -> Self {
        Self {
            unique_attribute: Some(attribute),
            ..Self::default()
        }
    }

    pub fn get_attribute_type(&self, id: &AttributeId) -> Result<&ValueType, TypeCacheError> {
        self.attribute_types
            .get(id)
            .ok_or_else(|| TypeCacheError::AttributeNotResolved(id.clone()))
    }

    pub fn get_data_element_type(&self, id: &DataElementId) -> Result<&ValueType, TypeCacheError> {
        self.data_element_types
            .get(id)
            .ok_or_else(|| TypeCacheError::DataElementNotResolved(id.clone()))
    }

    pub fn has_attribute(&self, id: &AttributeId) -> bool {
        self.attribute_types.contains_key(id)
    }

    pub fn has_data_element(&self, id: &DataElementId) -> bool {
        self.data_element_types.contains_key(id)
    }

    /// Store an attribute type. The first attribute recorded as unique
    /// becomes the uniqueness key.
    pub fn record_attribute_type(&mut self, id: AttributeId, value_type: ValueType, is_unique: bool) {
        if is_unique && self.unique_attribute.is_none() {
            self.unique_attribute = Some(id.clone());
        }
        self.attribute_types.insert(id, value_type);
    }

    pub fn record_data_element_type(&mut self, id: DataElementId, value_type: ValueType) {
        self.data_element_types.insert(id, value_type);
    }

    pub fn unique_attribute(&self) -> Option<&AttributeId> {
        self.unique_attribute.as_ref()
    }

    pub fn coerce_attribute_value(
        &self,
        id: &AttributeId,
        raw: &str,
    ) -> Result<CoercedValue, TypeCacheError> {
        Ok(self.get_attribute_type(id)?.coerce(raw))
    }

    pub fn coerce_data_element_value(
        &self,
        id: &DataElementId,
        raw: &str,
    ) -> Result<CoercedValue, TypeCacheError> {
        Ok(self.get_data_element_type(id)?.coerce(raw))
    }

    pub fn attribute_count(&self) -> usize {
        self.attribute_types.len()
    }

    pub fn data_element_count(&self) -> usize {
        self.data_element_types.len()
    }
}
