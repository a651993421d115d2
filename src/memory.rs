use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{DbError, RecordStore};
use crate::models::{Article, NewArticle, NewProduct, Product};

/// Store en memoria; conserva el orden de inserción. Se pierde al reiniciar.
#[derive(Default)]
pub struct MemoryStore {
    articles: RwLock<Vec<Article>>,
    products: RwLock<Vec<Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_article(&self, input: NewArticle) -> Result<Article, DbError> {
        let article = Article {
            id: Uuid::new_v4(),
            title: input.title,
            domain: input.domain,
            content: input.content,
            image: input.image,
            date: Utc::now(),
        };
        self.articles.write().await.push(article.clone());
        Ok(article)
    }

    async fn list_articles(&self) -> Result<Vec<Article>, DbError> {
        Ok(self.articles.read().await.clone())
    }

    async fn delete_article(&self, id: Uuid) -> Result<bool, DbError> {
        let mut articles = self.articles.write().await;
        let before = articles.len();
        articles.retain(|a| a.id != id);
        Ok(articles.len() < before)
    }

    async fn insert_product(&self, input: NewProduct) -> Result<Product, DbError> {
        let product = Product {
            id: Uuid::new_v4(),
            name: input.name,
            category: input.category,
            description: input.description,
            dimensions: input.dimensions,
            weight: input.weight,
            material: input.material,
            image: input.image,
            price: input.price,
            availability: input.availability,
            customizable: input.customizable,
            created_at: Utc::now(),
        };
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn list_products(&self) -> Result<Vec<Product>, DbError> {
        Ok(self.products.read().await.clone())
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, DbError> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_only_once() {
        let store = MemoryStore::new();
        let a = store
            .insert_article(NewArticle {
                title: Some("A".into()),
                ..NewArticle::default()
            })
            .await
            .unwrap();
        let b = store.insert_article(NewArticle::default()).await.unwrap();

        assert!(store.delete_article(a.id).await.unwrap());
        assert!(!store.delete_article(a.id).await.unwrap());

        let left = store.list_articles().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b.id);
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for title in ["uno", "dos", "tres"] {
            let a = store
                .insert_article(NewArticle {
                    title: Some(title.into()),
                    ..NewArticle::default()
                })
                .await
                .unwrap();
            ids.push(a.id);
        }
        let listed: Vec<Uuid> = store
            .list_articles()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(listed, ids);
    }
}
