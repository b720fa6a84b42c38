//! Outfit decision engine.
//!
//! Rules run in priority order: condition overrides, then the temperature
//! bracket, then the air-quality overlay. A later rule only fills slots an
//! earlier rule left empty.

use crate::model::{ClothingOutfit, Condition, WeatherReading, items};

/// Stateless outfit recommender. Cheap to construct; pass it by reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stylist;

/// Outfit under construction. `None` means "not chosen yet".
#[derive(Debug, Default)]
struct Draft {
    top: Option<&'static str>,
    bottom: Option<&'static str>,
    shoes: Option<&'static str>,
    outer: Option<&'static str>,
    accessory: Option<&'static str>,
}

fn fill(slot: &mut Option<&'static str>, value: &'static str) {
    slot.get_or_insert(value);
}

impl Draft {
    fn finish(self, has_mask: bool) -> ClothingOutfit {
        ClothingOutfit {
            top: self.top.unwrap_or(items::BASIC_TSHIRT).to_string(),
            bottom: self.bottom.unwrap_or(items::BASIC_SHORTS).to_string(),
            shoes: self.shoes.unwrap_or(items::BASIC_SHOES).to_string(),
            outer: self.outer.map(str::to_string),
            accessory: self.accessory.map(str::to_string),
            has_mask,
        }
    }
}

/// Temperature bands, lower bound inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Freezing,
    Cold,
    Chilly,
    Cool,
    Mild,
    Warm,
    Hot,
}

impl Bracket {
    fn of(temperature: f64) -> Self {
        if temperature < 5.0 {
            Bracket::Freezing
        } else if temperature < 10.0 {
            Bracket::Cold
        } else if temperature < 15.0 {
            Bracket::Chilly
        } else if temperature < 20.0 {
            Bracket::Cool
        } else if temperature < 24.0 {
            Bracket::Mild
        } else if temperature < 28.0 {
            Bracket::Warm
        } else {
            Bracket::Hot
        }
    }
}

impl Stylist {
    pub fn new() -> Self {
        Self
    }

    /// Recommend an outfit for the given conditions.
    ///
    /// `temperature` must be finite; a NaN or infinite value is a caller bug.
    pub fn recommend(
        &self,
        temperature: f64,
        condition: Condition,
        is_bad_air: bool,
    ) -> ClothingOutfit {
        debug_assert!(
            temperature.is_finite(),
            "recommend called with non-finite temperature {temperature}"
        );

        let mut draft = Draft::default();
        apply_condition(&mut draft, temperature, condition);
        apply_bracket(&mut draft, Bracket::of(temperature));
        draft.finish(is_bad_air)
    }

    /// Convenience wrapper taking a full reading.
    pub fn recommend_for(&self, reading: &WeatherReading) -> ClothingOutfit {
        self.recommend(reading.temperature, reading.condition, reading.is_bad_air())
    }
}

fn apply_condition(draft: &mut Draft, temperature: f64, condition: Condition) {
    match condition {
        Condition::Rain => {
            draft.accessory = Some(items::UMBRELLA);
            draft.shoes = Some(items::RAIN_BOOTS);
            if temperature < 18.0 {
                draft.outer = Some(items::LIGHT_JACKET);
            }
        }
        Condition::Snow => {
            draft.accessory = Some(items::GLOVES);
            draft.shoes = Some(items::WINTER_BOOTS);
            if temperature < 5.0 {
                draft.outer = Some(items::PADDING);
            }
        }
        Condition::Storm => {
            draft.accessory = Some(items::UMBRELLA);
            draft.shoes = Some(items::RAIN_BOOTS);
            if temperature < 10.0 {
                draft.outer = Some(items::PADDING);
            }
        }
        Condition::Clear | Condition::Cloudy => {}
    }
}

fn apply_bracket(draft: &mut Draft, bracket: Bracket) {
    let (top, bottom, shoes) = match bracket {
        Bracket::Freezing => {
            fill(&mut draft.outer, items::PADDING);
            fill(&mut draft.accessory, items::MUFFLER);
            ("sweatshirt", "padded-pants", items::WINTER_BOOTS)
        }
        Bracket::Cold => {
            fill(&mut draft.outer, items::WOOL_COAT);
            ("heattech", "thick-pants", items::SNEAKERS)
        }
        Bracket::Chilly => {
            fill(&mut draft.outer, items::TRENCH_COAT);
            ("knit", "warm-pants", items::SNEAKERS)
        }
        Bracket::Cool => ("hoodie", "slacks", items::SNEAKERS),
        Bracket::Mild => ("long-sleeve-tshirt", "denim-pants", items::SNEAKERS),
        Bracket::Warm => ("short-sleeve-tshirt", "cotton-pants", items::SANDALS),
        Bracket::Hot => {
            fill(&mut draft.accessory, items::CAP);
            ("sleeveless", "short-shorts", items::SANDALS)
        }
    };

    draft.top = Some(top);
    draft.bottom = Some(bottom);
    fill(&mut draft.shoes, shoes);
}
