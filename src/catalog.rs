use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::identity::{authorized, Principal, Role, TokenVerifier};
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub nombre: String,
    pub descripcion: String,
    pub precio: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDraft {
    pub nombre: String,
    pub descripcion: String,
    pub precio: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<f64>,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("required fields: nombre, descripcion, precio")]
    Invalid,
    #[error("product not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl warp::reject::Reject for CatalogError {}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// All products, newest first.
    async fn list(&self) -> Result<Vec<Product>, StoreError>;
    async fn create(&self, draft: ProductDraft) -> Result<Product, StoreError>;
    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

fn clean_text(value: &str) -> Result<String, CatalogError> {
    match value.trim() {
        "" => Err(CatalogError::Invalid),
        text => Ok(text.to_string()),
    }
}

fn clean_price(value: f64) -> Result<f64, CatalogError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CatalogError::Invalid)
    }
}

impl ProductDraft {
    pub fn validate(self) -> Result<Self, CatalogError> {
        Ok(Self {
            nombre: clean_text(&self.nombre)?,
            descripcion: clean_text(&self.descripcion)?,
            precio: clean_price(self.precio)?,
        })
    }
}

impl ProductPatch {
    pub fn validate(self) -> Result<Self, CatalogError> {
        Ok(Self {
            nombre: self.nombre.as_deref().map(clean_text).transpose()?,
            descripcion: self.descripcion.as_deref().map(clean_text).transpose()?,
            precio: self.precio.map(clean_price).transpose()?,
        })
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(nombre) = self.nombre {
            product.nombre = nombre;
        }
        if let Some(descripcion) = self.descripcion {
            product.descripcion = descripcion;
        }
        if let Some(precio) = self.precio {
            product.precio = precio;
        }
    }
}

#[derive(Serialize)]
struct Deleted {
    message: &'static str,
}

fn reject(e: StoreError) -> Rejection {
    warp::reject::custom(CatalogError::Store(e))
}

fn with_catalog(
    catalog: Arc<dyn ProductCatalog>,
) -> impl Filter<Extract = (Arc<dyn ProductCatalog>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&catalog))
}

pub fn routes(
    catalog: Arc<dyn ProductCatalog>,
    verifier: TokenVerifier,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let admin = authorized(verifier, Role::Admin);

    let list = warp::path!("productos")
        .and(warp::get())
        .and(with_catalog(Arc::clone(&catalog)))
        .and_then(list_products);

    let create = warp::path!("productos")
        .and(warp::post())
        .and(admin.clone())
        .and(warp::body::json())
        .and(with_catalog(Arc::clone(&catalog)))
        .and_then(create_product);

    let update = warp::path!("productos" / String)
        .and(warp::put())
        .and(admin.clone())
        .and(warp::body::json())
        .and(with_catalog(Arc::clone(&catalog)))
        .and_then(update_product);

    let delete = warp::path!("productos" / String)
        .and(warp::delete())
        .and(admin)
        .and(with_catalog(catalog))
        .and_then(delete_product);

    list.or(create).or(update).or(delete)
}

async fn list_products(catalog: Arc<dyn ProductCatalog>) -> Result<impl Reply, Rejection> {
    let products = catalog.list().await.map_err(reject)?;
    Ok(warp::reply::json(&products))
}

async fn create_product(
    admin: Principal,
    draft: ProductDraft,
    catalog: Arc<dyn ProductCatalog>,
) -> Result<impl Reply, Rejection> {
    let draft = draft.validate().map_err(warp::reject::custom)?;
    let product = catalog.create(draft).await.map_err(reject)?;
    info!("Product {} created by {}", product.id, admin.id);
    Ok(warp::reply::with_status(
        warp::reply::json(&product),
        StatusCode::CREATED,
    ))
}

async fn update_product(
    id: String,
    admin: Principal,
    patch: ProductPatch,
    catalog: Arc<dyn ProductCatalog>,
) -> Result<impl Reply, Rejection> {
    let patch = patch.validate().map_err(warp::reject::custom)?;
    let product = catalog
        .update(&id, patch)
        .await
        .map_err(reject)?
        .ok_or_else(|| warp::reject::custom(CatalogError::NotFound))?;
    info!("Product {} updated by {}", product.id, admin.id);
    Ok(warp::reply::json(&product))
}

async fn delete_product(
    id: String,
    admin: Principal,
    catalog: Arc<dyn ProductCatalog>,
) -> Result<impl Reply, Rejection> {
    if !catalog.delete(&id).await.map_err(reject)? {
        return Err(warp::reject::custom(CatalogError::NotFound));
    }
    info!("Product {} deleted by {}", id, admin.id);
    Ok(warp::reply::json(&Deleted {
        message: "product deleted",
    }))
}
