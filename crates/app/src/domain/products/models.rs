//! Product Models

use atelier::pricing::Discount;
use jiff::Timestamp;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Material UUID
pub type MaterialUuid = TypedUuid<Material>;

/// Product Model
#[derive(Debug, Clone)]
pub struct Product {
    pub uuid: ProductUuid,
    /// Per-slot base price, minor units.
    pub base_price: u64,
    /// Discount applied when the shop supplies the fabric.
    pub fabric_discount: Option<Discount>,
    pub materials: Vec<Material>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Product {
    /// Look up one of this product's materials.
    #[must_use]
    pub fn material(&self, material: MaterialUuid) -> Option<&Material> {
        self.materials.iter().find(|m| m.uuid == material)
    }
}

/// A fabric option the customer can supply for a product.
#[derive(Debug, Clone)]
pub struct Material {
    pub uuid: MaterialUuid,
    pub product_uuid: ProductUuid,
    pub name: String,
    /// Handling cost added per slot when the customer supplies this
    /// material, minor units.
    pub extra_cost: u64,
    pub created_at: Timestamp,
}

/// New Product Model
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub base_price: u64,
    pub fabric_discount: Option<Discount>,
    pub materials: Vec<NewMaterial>,
}

/// New Material Model
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub uuid: MaterialUuid,
    pub name: String,
    pub extra_cost: u64,
}

/// Product Update Model
#[derive(Debug, Clone, Copy)]
pub struct ProductUpdate {
    pub base_price: u64,
    pub fabric_discount: Option<Discount>,
}
