use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Article, Category, Dimensions, Material, NewArticle, NewProduct, Product, UnknownVariant,
};

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Error de base de datos: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Registro corrupto: {0}")]
    Corrupt(#[from] UnknownVariant),
}

/// Operaciones que necesitan los handlers sobre las dos colecciones.
/// Cada llamada es atómica sólo a nivel de un documento.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_article(&self, input: NewArticle) -> Result<Article, DbError>;
    async fn list_articles(&self) -> Result<Vec<Article>, DbError>;
    /// `true` si existía y se borró.
    async fn delete_article(&self, id: Uuid) -> Result<bool, DbError>;

    async fn insert_product(&self, input: NewProduct) -> Result<Product, DbError>;
    async fn list_products(&self) -> Result<Vec<Product>, DbError>;
    async fn delete_product(&self, id: Uuid) -> Result<bool, DbError>;
}

/// Crea el pool con la URL y el tamaño configurados.
pub async fn get_db_pool(database_url: &str, max_connections: u32) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Crea las tablas si no existen. Los ids y las fechas los pone Postgres.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT,
            domain TEXT,
            content TEXT,
            image TEXT,
            date TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL,
            length DOUBLE PRECISION NOT NULL,
            width DOUBLE PRECISION NOT NULL,
            height DOUBLE PRECISION NOT NULL,
            weight DOUBLE PRECISION NOT NULL,
            material TEXT NOT NULL,
            image TEXT,
            price DOUBLE PRECISION NOT NULL,
            availability BOOLEAN NOT NULL DEFAULT TRUE,
            customizable BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Fila plana de `products`; las dimensiones van en tres columnas.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    category: String,
    description: String,
    length: f64,
    width: f64,
    height: f64,
    weight: f64,
    material: String,
    image: Option<String>,
    price: f64,
    availability: bool,
    customizable: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            name: row.name,
            category: row.category.parse::<Category>()?,
            description: row.description,
            dimensions: Dimensions {
                length: row.length,
                width: row.width,
                height: row.height,
            },
            weight: row.weight,
            material: row.material.parse::<Material>()?,
            image: row.image,
            price: row.price,
            availability: row.availability,
            customizable: row.customizable,
            created_at: row.created_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, name, category, description, length, width, height, weight, \
     material, image, price, availability, customizable, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Usa un pool ya abierto y asegura el esquema.
    pub async fn new(pool: PgPool) -> Result<Self, DbError> {
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }
}

// --- CRUD ---
#[async_trait]
impl RecordStore for PgStore {
    async fn insert_article(&self, input: NewArticle) -> Result<Article, DbError> {
        let rec = sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO articles (title, domain, content, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, domain, content, image, date
            "#,
        )
        .bind(input.title)
        .bind(input.domain)
        .bind(input.content)
        .bind(input.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(rec)
    }

    async fn list_articles(&self) -> Result<Vec<Article>, DbError> {
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, domain, content, image, date
            FROM articles
            ORDER BY date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(articles)
    }

    async fn delete_article(&self, id: Uuid) -> Result<bool, DbError> {
        let res = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_product(&self, input: NewProduct) -> Result<Product, DbError> {
        let sql = format!(
            r#"
            INSERT INTO products (name, category, description, length, width, height,
                                  weight, material, image, price, availability, customizable)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(input.name)
            .bind(input.category.as_str())
            .bind(input.description)
            .bind(input.dimensions.length)
            .bind(input.dimensions.width)
            .bind(input.dimensions.height)
            .bind(input.weight)
            .bind(input.material.as_str())
            .bind(input.image)
            .bind(input.price)
            .bind(input.availability)
            .bind(input.customizable)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn list_products(&self) -> Result<Vec<Product>, DbError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, DbError> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, material: &str) -> ProductRow {
        ProductRow {
            id: Uuid::new_v4(),
            name: "Poutre P1".into(),
            category: category.into(),
            description: "desc".into(),
            length: 600.0,
            width: 30.0,
            height: 50.0,
            weight: 2200.0,
            material: material.into(),
            image: None,
            price: 750.5,
            availability: true,
            customizable: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn product_row_maps_to_product() {
        let product = Product::try_from(row("Poutres", "Béton précontraint")).unwrap();
        assert_eq!(product.category, Category::Beams);
        assert_eq!(product.material, Material::PrestressedConcrete);
        assert_eq!(product.dimensions.length, 600.0);
        assert_eq!(product.dimensions.height, 50.0);
    }

    #[test]
    fn product_row_with_unknown_category_is_corrupt() {
        let err = Product::try_from(row("Toits", "Autre")).unwrap_err();
        assert!(matches!(err, DbError::Corrupt(_)));
    }
}
