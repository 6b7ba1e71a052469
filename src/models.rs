use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Catalog

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, ToSchema)]
#[diesel(table_name = crate::schema::product_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductTypeEntity {
    pub id: i32,
    pub name: String,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, ToSchema)]
#[diesel(table_name = crate::schema::manufacturers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ManufacturerEntity {
    pub id: i32,
    pub name: String,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: i32,
    pub name: String,
    pub price: i32,
    pub stock: i32,
    pub product_type_id: i32,
    pub manufacturer_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::products)]
pub struct CreateProductEntity {
    pub name: String,
    pub price: i32,
    pub stock: i32,
    pub product_type_id: i32,
    pub manufacturer_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, ToSchema)]
#[diesel(table_name = crate::schema::product_pictures)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductPictureEntity {
    pub id: i32,
    pub product_id: i32,
    pub file_ref: String,
    pub display_order: i32,
}

// Carts

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, ToSchema)]
#[diesel(table_name = crate::schema::carts)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartEntity {
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::carts)]
pub struct CreateCartEntity {
    pub user_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, ToSchema)]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemEntity {
    pub id: i32,
    pub cart_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::cart_items)]
pub struct CreateCartItemEntity {
    pub cart_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

// Addresses

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressEntity {
    pub id: i32,
    pub user_id: i32,
    pub zip_code: String,
    pub prefecture: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::addresses)]
pub struct CreateAddressEntity {
    pub user_id: i32,
    pub zip_code: String,
    pub prefecture: String,
    pub address: String,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub total_price: i64,
    pub address_id: Option<i32>,
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct CreateOrderEntity {
    pub total_price: i64,
    pub address_id: Option<i32>,
    pub user_id: Option<i32>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: i32,
    pub order_id: i32,
    pub product_id: Option<i32>,
    pub quantity: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub product_id: Option<i32>,
    pub quantity: i32,
}
