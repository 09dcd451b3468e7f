//! Demonstration of loading, reasoning and serializing
//!
//! This example shows:
//! - Parsing Turtle data and N3 rules
//! - RDFS saturation and user-defined rules
//! - Pattern queries over the store
//! - Writing the result back as Turtle

use quadstore::model::vocab::rdf;
use quadstore::{
    rdfs_rules, ExtractListOptions, Format, NamedNode, Object, Parser, Predicate, Reasoner, Rule,
    Store, Subject, Writer, WriterOptions,
};

const DATA: &str = r#"
@prefix ex: <http://example.org/>.
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#>.

ex:Surgeon rdfs:subClassOf ex:Doctor.
ex:Doctor rdfs:subClassOf ex:Person.
ex:alice a ex:Surgeon; ex:worksWith ex:bob; ex:shifts ( "mon" "wed" "fri" ).
ex:bob ex:worksWith ex:carol.
"#;

const RULES: &str = r#"
@prefix ex: <http://example.org/>.
{ ?a ex:worksWith ?b. ?b ex:worksWith ?c } => { ?a ex:knowsOf ?c }.
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("=== Quad Store Reasoning Demo ===\n");

    // 1. Load data
    println!("1. Loading Turtle data");
    let mut store = Store::from_quads(Parser::for_format("turtle")?.parse(DATA)?);
    println!("   ✓ {} quads loaded\n", store.len());

    // 2. Collections
    println!("2. Extracting RDF lists");
    let lists = store.extract_lists(ExtractListOptions::new().with_remove(true))?;
    for (head, items) in &lists {
        let shown: Vec<String> = items.iter().map(|item| item.to_string()).collect();
        println!("   ✓ list {} = [{}]", head, shown.join(", "));
    }
    println!("   ✓ {} quads left after removing list cells\n", store.len());

    // 3. RDFS
    println!("3. Applying RDFS rules");
    let added = Reasoner::new(&mut store).reason(&rdfs_rules())?;
    println!("   ✓ {} quads inferred\n", added);

    // 4. N3 rules
    println!("4. Applying N3 rules");
    let rules: Store = Parser::for_format("n3")?.parse(RULES)?.into_iter().collect();
    println!("   ✓ {} rule(s) found", Rule::from_dataset(&rules)?.len());
    let added = Reasoner::new(&mut store).reason_with_dataset(&rules)?;
    println!("   ✓ {} quads inferred\n", added);

    // 5. Query
    println!("5. Querying types of ex:alice");
    let alice = NamedNode::new("http://example.org/alice");
    let rdf_type = Predicate::from(NamedNode::new(rdf::TYPE));
    for class in store.get_objects(Some(&Subject::from(alice)), Some(&rdf_type), None) {
        println!("   - {}", class);
    }
    let person = Object::from(NamedNode::new("http://example.org/Person"));
    println!(
        "   ✓ {} member(s) of ex:Person\n",
        store.count_quads(None, Some(&rdf_type), Some(&person), None)
    );

    // 6. Serialize
    println!("6. Writing Turtle");
    let mut writer = Writer::new(
        WriterOptions::new(Format::TURTLE)
            .with_prefix("ex", "http://example.org/")
            .with_prefix("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    );
    writer.add_quads(store.iter())?;
    println!("{}", writer.end_to_string()?);

    println!("=== Demo Complete ===");
    Ok(())
}
