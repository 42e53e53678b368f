use std::sync::Arc;

use chrono::{TimeZone, Utc};
use factlens::{
    Document, Entity, InMemoryDocumentService, InMemoryRecordService, InfoboxClassifier,
    PredicateVocabulary, Record, RecordId, Resolver, ResolverConfig, TypeTag, Value,
};

fn rid(id: &str) -> RecordId {
    RecordId::new(id).unwrap()
}

fn setup() -> (Arc<Resolver>, Arc<InMemoryDocumentService>, Arc<InMemoryRecordService>) {
    let documents = Arc::new(InMemoryDocumentService::new());
    let records = Arc::new(InMemoryRecordService::new());

    documents
        .insert(Document::new("Kyiv", "{{Infobox settlement\n|name = Kyiv}}"))
        .unwrap();
    documents.add_redirect("Kiev", "Kyiv").unwrap();
    records
        .insert(
            Record::new(rid("Q1899"))
                .with_label("Kyiv")
                .with_sitelink("en", "Kyiv")
                .with_sitelink("uk", "Київ")
                .with_claim("P1082", 500)
                .with_claim(
                    "P2046",
                    Value::Quantity {
                        amount: 839.0,
                        unit: Some("km²".to_string()),
                    },
                ),
        )
        .unwrap();

    documents
        .insert(Document::new("Ada Lovelace", "{{Infobox person\n|name=Ada}}"))
        .unwrap();
    records
        .insert(
            Record::new(rid("Q7259"))
                .with_label("Ada Lovelace")
                .with_sitelink("en", "Ada Lovelace")
                .with_claim(
                    "P569",
                    Utc.with_ymd_and_hms(1815, 12, 10, 0, 0, 0).unwrap(),
                )
                .with_claim(
                    "P570",
                    Utc.with_ymd_and_hms(1852, 11, 27, 0, 0, 0).unwrap(),
                ),
        )
        .unwrap();

    let resolver = Resolver::new(documents.clone(), records.clone())
        .with_extractor(Arc::new(
            PredicateVocabulary::strict()
                .with("P1082", "population")
                .with("P2046", "area")
                .with("P569", "birth date")
                .with("P570", "death date"),
        ))
        .into_shared();
    (resolver, documents, records)
}

#[test]
fn dynamic_accessor_returns_attribute_or_none() {
    let (resolver, _, _) = setup();
    let mut kyiv = Entity::new(resolver, "Kyiv");
    assert_eq!(kyiv.get("population").unwrap(), Some(Value::Int(500)));
    assert_eq!(kyiv.get("no_such_thing").unwrap(), None);
}

#[test]
fn reserved_names_fail_without_resolving() {
    let (resolver, documents, records) = setup();
    let mut kyiv = Entity::new(resolver, "Kyiv");
    for name in ["population?", "population!", "population=", "to_a", "to_int"] {
        assert!(kyiv.get(name).unwrap_err().is_no_such_member());
    }
    assert!(!kyiv.is_loaded());
    assert_eq!(documents.calls().total() + records.calls().total(), 0);
}

#[test]
fn repeated_load_changes_nothing() {
    let (resolver, documents, _) = setup();
    let mut kyiv = Entity::new(resolver, "Kiev");
    kyiv.load().unwrap();
    let document = kyiv.document().cloned();
    let record = kyiv.record().cloned();
    let attributes = kyiv.attributes().clone();

    kyiv.load().unwrap();
    kyiv.load().unwrap();
    assert_eq!(kyiv.document().cloned(), document);
    assert_eq!(kyiv.record().cloned(), record);
    assert_eq!(kyiv.attributes(), &attributes);
    assert_eq!(documents.calls().total(), 1);
    assert_eq!(kyiv.name(), "Kyiv");
}

#[test]
fn type_checked_loader() {
    let (resolver, _, _) = setup();
    let city = Entity::load_of_type(resolver.clone(), "Kyiv", Some(&TypeTag::City)).unwrap();
    assert!(city.is_some_and(|c| c.is_loaded()));
    assert!(Entity::load_of_type(resolver.clone(), "Kyiv", Some(&TypeTag::Person))
        .unwrap()
        .is_none());
    assert!(Entity::load_of_type(resolver, "Atlantis", None)
        .unwrap()
        .is_none());
}

#[test]
fn type_capabilities_add_members() {
    let (resolver, _, _) = setup();
    let mut ada = Entity::new(resolver.clone(), "Ada Lovelace");
    assert_eq!(ada.get("age").unwrap(), Some(Value::Int(36)));
    assert_eq!(ada.get("alive").unwrap(), Some(Value::Bool(false)));
    assert!(ada.capability().is_some_and(|c| c.has_member("age")));

    let mut kyiv = Entity::new(resolver, "Kyiv");
    let density = kyiv.get("population_density").unwrap().unwrap();
    assert!((density.as_float().unwrap() - 500.0 / 839.0).abs() < 1e-9);
    // Only the person capability answers `age`.
    assert_eq!(kyiv.get("age").unwrap(), None);
}

#[test]
fn load_by_record_id_then_cross_reference() {
    let (resolver, documents, records) = setup();
    let mut kyiv = Entity::with_record_id(resolver, "Q1899", rid("Q1899"));
    assert!(kyiv.load().unwrap());
    assert_eq!(kyiv.name(), "Kyiv");
    assert_eq!(kyiv.type_tag(), Some(&TypeTag::City));
    assert_eq!(records.calls().single, 1);
    assert_eq!(documents.calls().single, 1);
}

#[test]
fn cross_reference_language_is_configurable() {
    let (_, documents, records) = setup();
    documents
        .insert(Document::new("Київ", "{{Infobox settlement}}"))
        .unwrap();
    let resolver = Resolver::new(documents, records)
        .with_config(ResolverConfig::default().with_language("uk"))
        .unwrap()
        .into_shared();

    let mut kyiv = Entity::with_record_id(resolver, "Q1899", rid("Q1899"));
    kyiv.load().unwrap();
    assert_eq!(kyiv.name(), "Київ");
}

#[test]
fn matching_service_language_resolves_records_by_name() {
    let documents = Arc::new(InMemoryDocumentService::new());
    let records = Arc::new(InMemoryRecordService::with_language("uk"));
    documents
        .insert(Document::new("Київ", "{{Infobox settlement}}"))
        .unwrap();
    records
        .insert(
            Record::new(rid("Q1899"))
                .with_sitelink("en", "Kyiv")
                .with_sitelink("uk", "Київ")
                .with_claim("P1082", 500),
        )
        .unwrap();
    let resolver = Resolver::new(documents, records)
        .with_config(ResolverConfig::default().with_language("uk"))
        .unwrap()
        .into_shared();

    let mut kyiv = Entity::new(resolver, "Київ");
    assert!(kyiv.load().unwrap());
    assert_eq!(kyiv.record().map(|r| r.id.as_str()), Some("Q1899"));
}

#[test]
fn custom_classifier_is_used() {
    let (_, documents, records) = setup();
    documents
        .insert(Document::new("Dnipro", "{{Infobox river}}"))
        .unwrap();
    let resolver = Resolver::new(documents, records)
        .with_classifier(Arc::new(
            InfoboxClassifier::new().with_template("river", TypeTag::Custom("river".into())),
        ))
        .into_shared();

    let dnipro = Entity::load_of_type(resolver, "Dnipro", Some(&TypeTag::Custom("river".into())))
        .unwrap()
        .unwrap();
    assert_eq!(dnipro.inspect(), "#<Entity(Dnipro):custom:river>");
}

#[test]
fn structured_projection_is_plain_json() {
    let (resolver, _, _) = setup();
    let mut ada = Entity::new(resolver, "Ada Lovelace");
    let json: serde_json::Value = serde_json::from_str(&ada.to_json().unwrap()).unwrap();
    assert_eq!(json["name"], "Ada Lovelace");
    assert!(json["birth_date"].as_str().unwrap().starts_with("1815-12-10"));

    let mut kyiv = Entity::new(ada.resolver().clone(), "Kyiv");
    let map = kyiv.to_structured().unwrap();
    assert_eq!(map["area"], serde_json::json!({"amount": 839.0, "unit": "km²"}));
}

#[test]
fn prefetched_document_is_processed_on_build() {
    let (resolver, documents, records) = setup();
    let kyiv = Entity::builder(resolver, "Kyiv")
        .document(Document::new("Kyiv", "{{Infobox settlement}}"))
        .record(Record::new(rid("Q1899")).with_claim("P1082", 7))
        .build()
        .unwrap();
    assert!(kyiv.is_loaded());
    assert_eq!(kyiv.type_tag(), Some(&TypeTag::City));
    assert_eq!(kyiv.attribute("population"), Some(&Value::Int(7)));
    assert_eq!(documents.calls().total() + records.calls().total(), 0);
}

#[test]
fn display_forms() {
    let (resolver, _, _) = setup();
    let mut kyiv = Entity::new(resolver.clone(), "Kyiv");
    assert_eq!(format!("{kyiv}"), "Kyiv?");
    kyiv.load().unwrap();
    assert_eq!(format!("{kyiv}"), "Kyiv");
    assert_eq!(kyiv.inspect(), "#<Entity(Kyiv):city>");

    let comma = Entity::new(resolver, "Paris, Texas");
    assert_eq!(format!("{comma}"), "\"Paris, Texas\"?");
}
