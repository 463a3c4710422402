use recon_model::{Model, PropertyType};

#[test]
fn default_model_schemata_are_consistent() {
	let model = Model::default_model().expect("Default model must load.");

	for schema in model.schemata() {
		for parent in &schema.extends {
			let parent = model.get(parent).expect("Parent schema must exist.");

			assert!(parent.descendants.contains(&schema.name));
		}

		for prop in schema.properties.values() {
			if prop.type_ == PropertyType::Entity {
				let range = prop.range.as_deref().expect("Entity properties must declare a range.");

				assert!(model.get(range).is_some(), "Unknown range {range} on {}.", prop.qname);
			}
		}

		if schema.matchable {
			assert!(!schema.abstract_, "{} must not be both abstract and matchable.", schema.name);
		}
	}
}

#[test]
fn caption_properties_exist_on_their_schema() {
	let model = Model::default_model().expect("Default model must load.");

	for schema in model.schemata() {
		for caption in &schema.caption {
			assert!(
				schema.get(caption).is_some(),
				"Caption property {caption} missing on {}.",
				schema.name
			);
		}
	}
}
