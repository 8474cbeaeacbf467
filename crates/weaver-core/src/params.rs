//! Generation parameters and the parameter selector.
//!
//! Six enumerated knobs shape every poem. Each one is either chosen
//! explicitly (by name, case-insensitive) or sampled uniformly for a
//! "surprise" request.

use crate::error::InvalidParameter;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString, VariantArray};

/// Common behaviour of the six parameter domains.
pub trait ParameterDomain:
    Copy + Default + fmt::Display + FromStr + VariantArray + 'static
{
    /// Field name used in messages and on the command line.
    const FIELD: &'static str;

    /// Parses an explicit choice, rejecting anything outside the domain.
    fn parse(value: &str) -> Result<Self, InvalidParameter> {
        value.trim().parse::<Self>().map_err(|_| InvalidParameter {
            field: Self::FIELD,
            value: value.to_string(),
            expected: Self::choices().join(", "),
        })
    }

    /// Samples one value uniformly from the domain.
    fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::VARIANTS[rng.gen_range(0..Self::VARIANTS.len())]
    }

    /// Display names of every value, in declaration order.
    fn choices() -> Vec<String> {
        Self::VARIANTS.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantArray)]
#[strum(ascii_case_insensitive)]
pub enum Style {
    #[default]
    Shakespearean,
    Modern,
    Haiku,
    Romantic,
    #[strum(to_string = "Free Verse", serialize = "free-verse", serialize = "freeverse")]
    FreeVerse,
    Gothic,
    Fantasy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantArray)]
#[strum(ascii_case_insensitive)]
pub enum Mood {
    #[default]
    Happy,
    Sad,
    Inspirational,
    Dark,
    Dreamy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantArray)]
#[strum(ascii_case_insensitive)]
pub enum Language {
    #[default]
    English,
    French,
    Spanish,
    German,
    Hindi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantArray)]
#[strum(ascii_case_insensitive)]
pub enum Tone {
    #[default]
    Soft,
    Bold,
    Whimsical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantArray)]
#[strum(ascii_case_insensitive)]
pub enum Length {
    #[default]
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantArray)]
#[strum(ascii_case_insensitive)]
pub enum Theme {
    #[default]
    Nature,
    Love,
    Time,
    Mystery,
    Fantasy,
    Loss,
    Hope,
}

macro_rules! parameter_domain {
    ($($ty:ty => $field:literal),* $(,)?) => {
        $(impl ParameterDomain for $ty {
            const FIELD: &'static str = $field;
        })*
    };
}

parameter_domain! {
    Style => "style",
    Mood => "mood",
    Language => "language",
    Tone => "tone",
    Length => "length",
    Theme => "theme",
}

/// A fully resolved parameter set. Immutable once built for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GenerationParameters {
    pub style: Style,
    pub mood: Mood,
    pub language: Language,
    pub tone: Tone,
    pub length: Length,
    pub theme: Theme,
}

impl GenerationParameters {
    /// Samples every field independently and uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            style: Style::sample(rng),
            mood: Mood::sample(rng),
            language: Language::sample(rng),
            tone: Tone::sample(rng),
            length: Length::sample(rng),
            theme: Theme::sample(rng),
        }
    }

    /// Resolves the parameters for one request.
    ///
    /// With `randomize` set the explicit selection is ignored and every field
    /// is sampled. Otherwise the selection passes through unchanged; fields
    /// left unset take the first value of their domain.
    pub fn resolve<R: Rng + ?Sized>(
        selection: &ParameterSelection,
        randomize: bool,
        rng: &mut R,
    ) -> Result<Self, InvalidParameter> {
        if randomize {
            return Ok(Self::random(rng));
        }
        selection.to_parameters()
    }

    /// Summary used when announcing a surprise selection.
    pub fn summary(&self) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}",
            self.style, self.mood, self.language, self.tone, self.length, self.theme
        )
    }
}

impl fmt::Display for GenerationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "style={}, mood={}, language={}, tone={}, length={}, theme={}",
            self.style, self.mood, self.language, self.tone, self.length, self.theme
        )
    }
}

/// Explicit, not yet validated parameter choices as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSelection {
    pub style: Option<String>,
    pub mood: Option<String>,
    pub language: Option<String>,
    pub tone: Option<String>,
    pub length: Option<String>,
    pub theme: Option<String>,
}

impl ParameterSelection {
    /// Sets one field by name. Unknown field names are rejected.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<(), InvalidParameter> {
        let value = value.into();
        let slot = match field.trim().to_ascii_lowercase().as_str() {
            "style" => &mut self.style,
            "mood" => &mut self.mood,
            "language" => &mut self.language,
            "tone" => &mut self.tone,
            "length" => &mut self.length,
            "theme" => &mut self.theme,
            _ => {
                return Err(InvalidParameter {
                    field: "parameter",
                    value: field.to_string(),
                    expected: "style, mood, language, tone, length, theme".to_string(),
                });
            }
        };
        *slot = Some(value);
        Ok(())
    }

    /// Validates every field against its domain.
    pub fn to_parameters(&self) -> Result<GenerationParameters, InvalidParameter> {
        Ok(GenerationParameters {
            style: parse_or_default(self.style.as_deref())?,
            mood: parse_or_default(self.mood.as_deref())?,
            language: parse_or_default(self.language.as_deref())?,
            tone: parse_or_default(self.tone.as_deref())?,
            length: parse_or_default(self.length.as_deref())?,
            theme: parse_or_default(self.theme.as_deref())?,
        })
    }
}

impl From<GenerationParameters> for ParameterSelection {
    fn from(params: GenerationParameters) -> Self {
        Self {
            style: Some(params.style.to_string()),
            mood: Some(params.mood.to_string()),
            language: Some(params.language.to_string()),
            tone: Some(params.tone.to_string()),
            length: Some(params.length.to_string()),
            theme: Some(params.theme.to_string()),
        }
    }
}

fn parse_or_default<T: ParameterDomain>(value: Option<&str>) -> Result<T, InvalidParameter> {
    value.map_or_else(|| Ok(T::default()), T::parse)
}

/// Every domain as (field, choices), for listings and completion.
pub fn all_domains() -> Vec<(&'static str, Vec<String>)> {
    vec![
        (Style::FIELD, Style::choices()),
        (Mood::FIELD, Mood::choices()),
        (Language::FIELD, Language::choices()),
        (Tone::FIELD, Tone::choices()),
        (Length::FIELD, Length::choices()),
        (Theme::FIELD, Theme::choices()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn assert_covers<T, F>(draws: &[GenerationParameters], pick: F)
    where
        T: ParameterDomain + Eq + std::hash::Hash + fmt::Debug,
        F: Fn(&GenerationParameters) -> T,
    {
        let seen: HashSet<T> = draws.iter().map(pick).collect();
        for value in T::VARIANTS {
            assert!(seen.contains(value), "{} never sampled {:?}", T::FIELD, value);
        }
    }

    #[test]
    fn test_randomized_resolve_covers_every_domain() {
        let mut rng = StdRng::seed_from_u64(7);
        let selection = ParameterSelection::default();
        let draws: Vec<_> = (0..500)
            .map(|_| GenerationParameters::resolve(&selection, true, &mut rng).unwrap())
            .collect();

        assert_covers(&draws, |p| p.style);
        assert_covers(&draws, |p| p.mood);
        assert_covers(&draws, |p| p.language);
        assert_covers(&draws, |p| p.tone);
        assert_covers(&draws, |p| p.length);
        assert_covers(&draws, |p| p.theme);
    }

    #[test]
    fn test_explicit_selection_passes_through() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut selection = ParameterSelection::default();
        selection.set("style", "haiku").unwrap();
        selection.set("mood", "Dreamy").unwrap();
        selection.set("language", "ENGLISH").unwrap();
        selection.set("tone", "Soft").unwrap();
        selection.set("length", "Short").unwrap();
        selection.set("theme", "Nature").unwrap();

        let params = GenerationParameters::resolve(&selection, false, &mut rng).unwrap();
        assert_eq!(params.style, Style::Haiku);
        assert_eq!(params.mood, Mood::Dreamy);
        assert_eq!(params.language, Language::English);
        assert_eq!(params.theme, Theme::Nature);
    }

    #[test]
    fn test_unset_fields_default_to_first_choice() {
        let params = ParameterSelection::default().to_parameters().unwrap();
        assert_eq!(params.style, Style::Shakespearean);
        assert_eq!(params.theme, Theme::Nature);
    }

    #[test]
    fn test_out_of_domain_value_is_rejected() {
        let selection = ParameterSelection {
            mood: Some("Furious".to_string()),
            ..Default::default()
        };
        let err = selection.to_parameters().unwrap_err();
        assert_eq!(err.field, "mood");
        assert_eq!(err.value, "Furious");
        assert!(err.expected.contains("Dreamy"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut selection = ParameterSelection::default();
        assert!(selection.set("meter", "iambic").is_err());
    }

    #[test]
    fn test_free_verse_display_and_parse() {
        assert_eq!(Style::FreeVerse.to_string(), "Free Verse");
        assert_eq!(Style::parse("free verse").unwrap(), Style::FreeVerse);
        assert_eq!(Style::parse("free-verse").unwrap(), Style::FreeVerse);
    }

    #[test]
    fn test_selection_round_trips_resolved_parameters() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = GenerationParameters::random(&mut rng);
        let selection = ParameterSelection::from(params);
        assert_eq!(selection.to_parameters().unwrap(), params);
    }
}
