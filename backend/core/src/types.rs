use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

/// A structured menu as produced by the extraction service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    #[serde(default)]
    pub restaurant_name: Option<String>,
    /// Display order matters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<MenuSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuSection {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dishes: Vec<Dish>,
}

/// A single dish. `name` is the identity key used to join images and
/// recommendations, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(rename = "dietary", default, deserialize_with = "null_as_default")]
    pub dietary_tags: BTreeSet<String>,
}

// Model output sends `null` for empty lists as often as it omits them.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Dish {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Absent or non-positive prices mean "no price data".
    pub fn has_price(&self) -> bool {
        self.price.map(|p| p > 0.0).unwrap_or(false)
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

impl Menu {
    pub fn dishes(&self) -> impl Iterator<Item = &Dish> {
        self.sections.iter().flat_map(|s| s.dishes.iter())
    }

    /// Dish names in display order.
    pub fn dish_names(&self) -> Vec<&str> {
        self.dishes().map(|d| d.name.as_str()).collect()
    }

    pub fn dish_count(&self) -> usize {
        self.sections.iter().map(|s| s.dishes.len()).sum()
    }

    pub fn find_dish(&self, name: &str) -> Option<&Dish> {
        self.dishes().find(|d| d.matches_name(name))
    }

    /// Prices are only worth showing when every dish carries one.
    pub fn all_dishes_priced(&self) -> bool {
        self.dishes().all(Dish::has_price)
    }
}

/// Wire entry of the image service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishImages {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
}

/// Wire shape of `getImages`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub dishes: Vec<DishImages>,
}

/// Per-dish image URLs. Keys keep the casing the image service returned;
/// lookups are case-insensitive. A missing dish simply has no images.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DishImageSet {
    entries: HashMap<String, DishImages>,
}

impl DishImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, images: Vec<String>) {
        let name = name.into();
        self.entries
            .insert(name.to_lowercase(), DishImages { name, images });
    }

    pub fn images_for(&self, dish_name: &str) -> &[String] {
        self.entries
            .get(&dish_name.to_lowercase())
            .map(|e| e.images.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names as returned by the image service.
    pub fn dish_names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.name.as_str())
    }

    /// Back to wire shape, ordered by dish name.
    pub fn to_response(&self) -> ImagesResponse {
        let mut dishes: Vec<DishImages> = self.entries.values().cloned().collect();
        dishes.sort_by(|a, b| a.name.cmp(&b.name));
        ImagesResponse { dishes }
    }
}

impl From<ImagesResponse> for DishImageSet {
    fn from(response: ImagesResponse) -> Self {
        let mut set = DishImageSet::new();
        for dish in response.dishes {
            set.insert(dish.name, dish.images);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_menu() -> Menu {
        Menu {
            restaurant_name: Some("Pho Real".into()),
            sections: vec![
                MenuSection {
                    name: "Starters".into(),
                    dishes: vec![Dish::new("Spring Rolls").with_price(6.5)],
                },
                MenuSection {
                    name: "Mains".into(),
                    dishes: vec![Dish::new("Pho Tai").with_price(14.0), Dish::new("Bun Cha")],
                },
            ],
        }
    }

    #[test]
    fn dish_names_keep_display_order() {
        let menu = sample_menu();
        assert_eq!(menu.dish_names(), vec!["Spring Rolls", "Pho Tai", "Bun Cha"]);
        assert_eq!(menu.dish_count(), 3);
    }

    #[test]
    fn find_dish_ignores_case() {
        let menu = sample_menu();
        assert_eq!(menu.find_dish("pho tai").map(|d| d.price), Some(Some(14.0)));
        assert!(menu.find_dish("banh mi").is_none());
    }

    #[test]
    fn non_positive_price_is_no_price() {
        assert!(!Dish::new("Water").with_price(0.0).has_price());
        assert!(!Dish::new("Bread").has_price());
        assert!(!sample_menu().all_dishes_priced());
    }

    #[test]
    fn parses_wire_menu() {
        let json = r#"{
            "restaurant_name": null,
            "sections": [{"name": "Desserts", "dishes": [
                {"name": "Flan", "description": "caramel", "price": 7.0, "dietary": ["vegetarian", "gluten-free"]}
            ]}]
        }"#;
        let menu: Menu = serde_json::from_str(json).unwrap();
        let flan = menu.find_dish("FLAN").unwrap();
        assert!(flan.dietary_tags.contains("gluten-free"));
        assert_eq!(flan.description.as_deref(), Some("caramel"));
    }

    #[test]
    fn null_lists_decode_as_empty() {
        let json = r#"{
            "restaurant_name": "Casa Lupe",
            "sections": [
                {"name": "Soups", "dishes": [
                    {"name": "Pozole", "price": null, "dietary": null}
                ]},
                {"name": "Specials", "dishes": null}
            ]
        }"#;
        let menu: Menu = serde_json::from_str(json).unwrap();
        assert!(menu.find_dish("pozole").unwrap().dietary_tags.is_empty());
        assert!(menu.sections[1].dishes.is_empty());

        let bare: Menu = serde_json::from_str(r#"{"sections": null}"#).unwrap();
        assert_eq!(bare, Menu::default());

        let images: ImagesResponse =
            serde_json::from_str(r#"{"dishes": [{"name": "Pozole", "images": null}]}"#).unwrap();
        assert!(DishImageSet::from(images).images_for("Pozole").is_empty());
    }

    #[test]
    fn image_set_joins_case_insensitively() {
        let set: DishImageSet = ImagesResponse {
            dishes: vec![DishImages {
                name: "Spring Rolls".into(),
                images: vec!["https://img/1.jpg".into()],
            }],
        }
        .into();
        assert_eq!(set.images_for("spring rolls"), ["https://img/1.jpg".to_string()]);
        assert!(set.images_for("Pho Tai").is_empty());
    }

    #[test]
    fn later_duplicate_overwrites() {
        let mut set = DishImageSet::new();
        set.insert("Flan", vec!["a".into()]);
        set.insert("FLAN", vec!["b".into()]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.images_for("flan"), ["b".to_string()]);
    }
}
