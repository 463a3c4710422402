use serde::{Deserialize, Serialize};

const COUNTRY_NAMES: [(&str, &str); 48] = [
	("ae", "United Arab Emirates"),
	("af", "Afghanistan"),
	("am", "Armenia"),
	("ar", "Argentina"),
	("at", "Austria"),
	("au", "Australia"),
	("az", "Azerbaijan"),
	("be", "Belgium"),
	("bg", "Bulgaria"),
	("br", "Brazil"),
	("by", "Belarus"),
	("ca", "Canada"),
	("ch", "Switzerland"),
	("cn", "China"),
	("cu", "Cuba"),
	("cy", "Cyprus"),
	("cz", "Czech Republic"),
	("de", "Germany"),
	("dk", "Denmark"),
	("es", "Spain"),
	("fi", "Finland"),
	("fr", "France"),
	("gb", "United Kingdom"),
	("ge", "Georgia"),
	("gr", "Greece"),
	("hk", "Hong Kong"),
	("in", "India"),
	("iq", "Iraq"),
	("ir", "Iran"),
	("it", "Italy"),
	("jp", "Japan"),
	("kp", "North Korea"),
	("kz", "Kazakhstan"),
	("lb", "Lebanon"),
	("lv", "Latvia"),
	("ly", "Libya"),
	("mm", "Myanmar"),
	("nl", "Netherlands"),
	("pa", "Panama"),
	("pl", "Poland"),
	("ru", "Russia"),
	("sy", "Syria"),
	("tr", "Turkey"),
	("ua", "Ukraine"),
	("us", "United States"),
	("ve", "Venezuela"),
	("ye", "Yemen"),
	("zz", "Global"),
];
const TOPIC_NAMES: [(&str, &str); 14] = [
	("corp.disqual", "Disqualified"),
	("crime", "Crime"),
	("crime.fin", "Financial crime"),
	("crime.terror", "Terrorism"),
	("crime.traffick", "Trafficking"),
	("crime.war", "War crimes"),
	("debarment", "Debarred entity"),
	("export.control", "Export controlled"),
	("poi", "Person of interest"),
	("role.oligarch", "Oligarch"),
	("role.pep", "Politician"),
	("role.rca", "Close Associate"),
	("sanction", "Sanctioned entity"),
	("sanction.linked", "Sanction-linked entity"),
];

/// Value types a schema property can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
	Name,
	Text,
	String,
	Address,
	Country,
	Date,
	Identifier,
	Email,
	Phone,
	Url,
	Entity,
	Topic,
	Gender,
	Number,
}
impl PropertyType {
	pub const ALL: [PropertyType; 14] = [
		Self::Name,
		Self::Text,
		Self::String,
		Self::Address,
		Self::Country,
		Self::Date,
		Self::Identifier,
		Self::Email,
		Self::Phone,
		Self::Url,
		Self::Entity,
		Self::Topic,
		Self::Gender,
		Self::Number,
	];

	/// Index field that collects every value of this type across properties.
	pub fn group(self) -> Option<&'static str> {
		match self {
			Self::Name => Some("names"),
			Self::Address => Some("addresses"),
			Self::Country => Some("countries"),
			Self::Date => Some("dates"),
			Self::Identifier => Some("identifiers"),
			Self::Email => Some("emails"),
			Self::Phone => Some("phones"),
			Self::Url => Some("urls"),
			Self::Entity => Some("entities"),
			Self::Topic => Some("topics"),
			Self::Gender => Some("genders"),
			Self::Text | Self::String | Self::Number => None,
		}
	}

	pub fn from_group(group: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|type_| type_.group() == Some(group))
	}

	/// Free-form text, matched by analysis rather than exact terms.
	pub fn is_text(self) -> bool {
		matches!(self, Self::Name | Self::Address | Self::Text | Self::String)
	}

	pub fn plural(self) -> &'static str {
		match self {
			Self::Name => "Names",
			Self::Text => "Texts",
			Self::String => "Labels",
			Self::Address => "Addresses",
			Self::Country => "Countries",
			Self::Date => "Dates",
			Self::Identifier => "Identifiers",
			Self::Email => "E-Mail Addresses",
			Self::Phone => "Phone numbers",
			Self::Url => "URLs",
			Self::Entity => "Entities",
			Self::Topic => "Topics",
			Self::Gender => "Genders",
			Self::Number => "Numbers",
		}
	}

	/// Human-readable rendering of a stored value.
	pub fn caption(self, value: &str) -> String {
		let table: &[(&str, &str)] = match self {
			Self::Country => &COUNTRY_NAMES,
			Self::Topic => &TOPIC_NAMES,
			_ => return value.to_string(),
		};
		let key = value.trim().to_lowercase();

		table
			.iter()
			.find(|(code, _)| *code == key)
			.map(|(_, label)| (*label).to_string())
			.unwrap_or_else(|| value.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn groups_round_trip_through_lookup() {
		for type_ in PropertyType::ALL {
			if let Some(group) = type_.group() {
				assert_eq!(PropertyType::from_group(group), Some(type_));
			}
		}

		assert_eq!(PropertyType::from_group("schema"), None);
	}

	#[test]
	fn captions_resolve_known_codes_only() {
		assert_eq!(PropertyType::Country.caption("de"), "Germany");
		assert_eq!(PropertyType::Country.caption("DE"), "Germany");
		assert_eq!(PropertyType::Country.caption("xk"), "xk");
		assert_eq!(PropertyType::Topic.caption("role.pep"), "Politician");
		assert_eq!(PropertyType::Date.caption("2001-02"), "2001-02");
	}

	#[test]
	fn text_types_are_not_exact_match_fields() {
		assert!(PropertyType::Name.is_text());
		assert!(PropertyType::Address.is_text());
		assert!(!PropertyType::Country.is_text());
		assert!(!PropertyType::Identifier.is_text());
	}
}
