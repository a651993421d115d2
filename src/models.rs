use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Article tal como se guarda y se devuelve por la API.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub date: DateTime<Utc>,
}

/// Datos para insertar un article; `id` y `date` los asigna el store.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: Option<String>,
    pub domain: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

/// Campos de texto recibidos en `/addarticles`. Ninguno es obligatorio.
#[derive(Debug, Default)]
pub struct ArticleForm {
    pub title: Option<String>,
    pub domain: Option<String>,
    pub content: Option<String>,
}

impl ArticleForm {
    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        Self {
            title: fields.remove("title"),
            domain: fields.remove("domain"),
            content: fields.remove("content"),
        }
    }

    pub fn into_new_article(self, image: Option<String>) -> NewArticle {
        NewArticle {
            title: self.title,
            domain: self.domain,
            content: self.content,
            image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Murs")]
    Walls,
    #[serde(rename = "Dalles")]
    Slabs,
    #[serde(rename = "Poutres")]
    Beams,
    #[serde(rename = "Colonnes")]
    Columns,
    #[serde(rename = "Autres")]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Walls,
        Category::Slabs,
        Category::Beams,
        Category::Columns,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Walls => "Murs",
            Category::Slabs => "Dalles",
            Category::Beams => "Poutres",
            Category::Columns => "Colonnes",
            Category::Other => "Autres",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Material {
    #[serde(rename = "Béton armé")]
    ReinforcedConcrete,
    #[serde(rename = "Béton précontraint")]
    PrestressedConcrete,
    #[serde(rename = "Autre")]
    Other,
}

impl Material {
    pub const ALL: [Material; 3] = [
        Material::ReinforcedConcrete,
        Material::PrestressedConcrete,
        Material::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Material::ReinforcedConcrete => "Béton armé",
            Material::PrestressedConcrete => "Béton précontraint",
            Material::Other => "Autre",
        }
    }
}

/// Valor fuera de la enumeración (en el formulario o en una fila guardada).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` no es un valor válido de {}", self.value, self.kind)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "categoría",
                value: s.to_string(),
            })
    }
}

impl FromStr for Material {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "material",
                value: s.to_string(),
            })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Acepta `100` o `"100"`, como el cast de números del formulario.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| de::Error::custom(format!("`{raw}` no es un número"))),
    }
}

/// Medidas en centímetros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(deserialize_with = "lenient_f64")]
    pub length: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub width: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub dimensions: Dimensions,
    /// kg
    pub weight: f64,
    pub material: Material,
    pub image: Option<String>,
    pub price: f64,
    pub availability: bool,
    pub customizable: bool,
    pub created_at: DateTime<Utc>,
}

/// Producto ya validado, listo para insertar.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: Category,
    pub description: String,
    pub dimensions: Dimensions,
    pub weight: f64,
    pub material: Material,
    pub image: Option<String>,
    pub price: f64,
    pub availability: bool,
    pub customizable: bool,
}

/// Campos de texto tal cual llegan a `/addproduct`.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub dimensions: Option<String>,
    pub weight: Option<String>,
    pub material: Option<String>,
    pub price: Option<String>,
    pub availability: Option<String>,
    pub customizable: Option<String>,
}

/// Formulario inválido; el mensaje se devuelve al cliente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

/// Un campo vacío cuenta como ausente.
fn required(value: Option<String>, field: &str) -> Result<String, ValidationError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError(format!("`{field}` es obligatorio")))
}

fn number(value: Option<String>, field: &str) -> Result<f64, ValidationError> {
    let raw = required(value, field)?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationError(format!("`{field}` debe ser un número, recibido `{raw}`")))
}

fn flag(value: Option<String>, field: &str, default: bool) -> Result<bool, ValidationError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ValidationError(format!(
            "`{field}` debe ser un booleano, recibido `{raw}`"
        ))),
    }
}

impl ProductForm {
    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        Self {
            name: fields.remove("name"),
            category: fields.remove("category"),
            description: fields.remove("description"),
            dimensions: fields.remove("dimensions"),
            weight: fields.remove("weight"),
            material: fields.remove("material"),
            price: fields.remove("price"),
            availability: fields.remove("availability"),
            customizable: fields.remove("customizable"),
        }
    }

    /// Valida todos los campos. `image` se rellena después, cuando ya se
    /// resolvió la subida.
    pub fn validate(self) -> Result<NewProduct, ValidationError> {
        let name = required(self.name, "name")?.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError("`name` no puede estar vacío".into()));
        }

        let category = required(self.category, "category")?
            .parse::<Category>()
            .map_err(|e| ValidationError(e.to_string()))?;
        let description = required(self.description, "description")?;

        let raw_dimensions = required(self.dimensions, "dimensions")?;
        let dimensions: Dimensions = serde_json::from_str(&raw_dimensions)
            .map_err(|e| ValidationError(format!("`dimensions` no es un JSON válido: {e}")))?;

        let weight = number(self.weight, "weight")?;
        let material = required(self.material, "material")?
            .parse::<Material>()
            .map_err(|e| ValidationError(e.to_string()))?;
        let price = number(self.price, "price")?;
        let availability = flag(self.availability, "availability", true)?;
        let customizable = flag(self.customizable, "customizable", false)?;

        Ok(NewProduct {
            name,
            category,
            description,
            dimensions,
            weight,
            material,
            image: None,
            price,
            availability,
            customizable,
        })
    }
}

/// Body JSON de `/removearticle` y `/removeproduct`.
#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub id: String,
}
