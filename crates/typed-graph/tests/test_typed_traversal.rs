use std::sync::Arc;
use synapse_frames::traversal::{both_edges, out_vertices};
use synapse_frames::{
    loop_n, Compare, DictionaryTypeRegistry, Direction, EdgeId, Element, FramesConfig,
    FramesContext, FramesError, Labels, MemberDescriptor, MemoryGraph, Model, ModelSet,
    OfTypeExt, PropertyGraph, Result, TypeName, Value, VertexId,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Person(Element);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Employee(Element);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Project(Element);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Knows(Element);

fn vertex(element: Element) -> VertexId {
    match element {
        Element::Vertex(v) => v,
        Element::Edge(e) => panic!("expected a vertex, got edge {}", e.0),
    }
}

impl Person {
    fn id(&self) -> VertexId {
        vertex(self.0)
    }
}

impl Employee {
    fn id(&self) -> VertexId {
        vertex(self.0)
    }
}

impl Project {
    fn id(&self) -> VertexId {
        vertex(self.0)
    }
}

impl Model for Person {
    const TYPE_NAME: &'static str = "acme.Person";
    fn members() -> &'static [MemberDescriptor] {
        const MEMBERS: &[MemberDescriptor] = &[
            MemberDescriptor::property("name"),
            MemberDescriptor::relation("friends", "knows", Direction::Out),
        ];
        MEMBERS
    }
    fn from_element(element: Element) -> Self {
        Person(element)
    }
}

impl Model for Employee {
    const TYPE_NAME: &'static str = "acme.Employee";
    fn members() -> &'static [MemberDescriptor] {
        Person::members()
    }
    fn supertypes() -> &'static [&'static str] {
        &["acme.Person"]
    }
    fn from_element(element: Element) -> Self {
        Employee(element)
    }
}

impl Model for Project {
    const TYPE_NAME: &'static str = "acme.Project";
    fn members() -> &'static [MemberDescriptor] {
        const MEMBERS: &[MemberDescriptor] = &[
            MemberDescriptor::property("title"),
            MemberDescriptor::relation("contributors", "created", Direction::In),
        ];
        MEMBERS
    }
    fn from_element(element: Element) -> Self {
        Project(element)
    }
}

impl Model for Knows {
    const TYPE_NAME: &'static str = "acme.Knows";
    fn from_element(element: Element) -> Self {
        Knows(element)
    }
}

fn models() -> Arc<ModelSet> {
    Arc::new(
        ModelSet::builder()
            .register::<Person>()
            .register::<Employee>()
            .register::<Project>()
            .register::<Knows>()
            .build(),
    )
}

fn context() -> FramesContext {
    FramesContext::with_graph_registry(FramesConfig::default(), models())
}

#[test]
fn test_frame_honours_subtypes() {
    let ctx = context();
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);

    let person = framed.add_vertex::<Person>().unwrap();
    let employee = framed.add_vertex::<Employee>().unwrap();
    let plain = graph.add_vertex().unwrap();

    assert_eq!(framed.frame::<Person>(employee.0).unwrap(), Some(Person(employee.0)));
    assert_eq!(framed.frame::<Employee>(person.0).unwrap(), None);
    assert_eq!(framed.frame::<Person>(plain.into()).unwrap(), None);
    assert_eq!(
        framed.resolve_type(employee.0).unwrap().map(|r| r.type_name),
        Some(TypeName::of::<Employee>())
    );
}

#[test]
fn test_typed_out_skips_incompatible_targets() {
    let ctx = context();
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);

    let marko = framed.add_vertex::<Person>().unwrap();
    let vadas = framed.add_vertex::<Person>().unwrap();
    let josh = framed.add_vertex::<Employee>().unwrap();
    let lop = framed.add_vertex::<Project>().unwrap();
    let stranger = graph.add_vertex().unwrap();
    for target in [vadas.id(), josh.id(), lop.id(), stranger] {
        framed.link::<Person>(marko.id(), target, "friends").unwrap();
    }

    let raw = framed
        .typed_out::<Person, Person>(marko.id(), "p.friends")
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(raw, vec![Some(vadas), Some(Person(josh.0)), None, None]);

    let friends: Vec<Person> = framed
        .typed_out::<Person, Person>(marko.id(), "friends")
        .unwrap()
        .of_type()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(friends, vec![vadas, Person(josh.0)]);

    let back: Vec<Person> = framed
        .typed_in::<Person, Person>(vadas.id(), "friends")
        .unwrap()
        .of_type()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(back, vec![marko]);
}

#[test]
fn test_branch_factor_bounds_typed_walks() {
    let ctx = context();
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);

    let hub = framed.add_vertex::<Person>().unwrap();
    for _ in 0..5 {
        let friend = framed.add_vertex::<Person>().unwrap();
        framed.link::<Person>(hub.id(), friend.id(), "friends").unwrap();
    }
    let bounded = framed
        .typed_vertices::<Person, Person>(hub.id(), "friends", Direction::Out, Some(2))
        .unwrap()
        .of_type()
        .count();
    assert_eq!(bounded, 2);
    let unbounded = framed
        .typed_vertices::<Person, Person>(hub.id(), "friends", Direction::Out, None)
        .unwrap()
        .count();
    assert_eq!(unbounded, 5);
}

#[test]
fn test_related_follows_the_declared_direction() {
    let ctx = context();
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);

    let marko = framed.add_vertex::<Person>().unwrap();
    let peter = framed.add_vertex::<Person>().unwrap();
    let lop = framed.add_vertex::<Project>().unwrap();
    // `contributors` is an inbound `created` relation.
    let edge = framed.link::<Project>(lop.id(), marko.id(), "contributors").unwrap();
    assert_eq!(
        graph.edge_endpoints(edge).unwrap(),
        (marko.id(), lop.id(), "created".to_string())
    );
    framed.link::<Project>(lop.id(), peter.id(), "contributors").unwrap();

    let contributors: Vec<Person> = framed
        .related::<Project, Person>(lop.id(), "contributors")
        .unwrap()
        .of_type()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(contributors, vec![marko, peter]);
}

#[test]
fn test_self_loop_is_seen_from_both_ends() {
    let ctx = context();
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);

    let narcissus = framed.add_vertex::<Person>().unwrap();
    let edge: Knows = framed
        .add_edge::<Knows>(narcissus.id(), narcissus.id(), "knows")
        .unwrap();

    let untyped: Vec<EdgeId> = both_edges(&graph, narcissus.id(), Labels::of(["knows"]))
        .unwrap()
        .collect();
    assert_eq!(untyped.len(), 2);

    let typed: Vec<Knows> = framed
        .typed_both_e::<Person, Knows>(narcissus.id(), "friends")
        .unwrap()
        .of_type()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(typed, vec![edge, edge]);
    assert_eq!(
        framed
            .typed_out_e::<Person, Knows>(narcissus.id(), "friends")
            .unwrap()
            .count(),
        1
    );
}

#[test]
fn test_bad_member_references_are_rejected() {
    let ctx = context();
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);
    let marko = framed.add_vertex::<Person>().unwrap();

    for member_ref in ["p.friends.name", "friends()", "enemies", ""] {
        assert!(
            matches!(
                framed.typed_out::<Person, Person>(marko.id(), member_ref),
                Err(FramesError::InvalidSelector { .. })
            ),
            "{member_ref}"
        );
    }
}

#[test]
fn test_unknown_marker_surfaces_from_walks() {
    let ctx = context();
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);

    let marko = framed.add_vertex::<Person>().unwrap();
    let corrupt = graph.add_vertex().unwrap();
    graph
        .set_property(corrupt.into(), ctx.registry().type_property(), Value::Long(424_242))
        .unwrap();
    framed.link::<Person>(marko.id(), corrupt, "friends").unwrap();

    let results: Vec<Result<Person>> = framed
        .typed_out::<Person, Person>(marko.id(), "friends")
        .unwrap()
        .of_type()
        .collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(FramesError::UnknownTypeMarker { .. })));
}

#[test]
fn test_vertices_of_and_typed_query() {
    let ctx = context();
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);

    let names = ["marko", "vadas", "josh"];
    let people: Vec<Person> = names
        .iter()
        .map(|name| {
            let person = framed.add_vertex::<Person>().unwrap();
            graph
                .set_property(person.0, "name", Value::from(*name))
                .unwrap();
            person
        })
        .collect();
    let employee = framed.add_vertex::<Employee>().unwrap();
    graph
        .set_property(employee.0, "name", Value::from("marko"))
        .unwrap();

    let all: Vec<Person> = framed
        .vertices_of::<Person>()
        .unwrap()
        .of_type()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(all, people);

    let mut query = framed.typed_query::<Person>();
    query.has_member("name", Compare::Equal, "marko").unwrap();
    // Employees are people too, so both markos come back.
    assert_eq!(query.count().unwrap(), 2);
    let found: Vec<Person> = query
        .vertices()
        .unwrap()
        .of_type()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(found, vec![people[0], Person(employee.0)]);

    assert!(matches!(
        framed.typed_query::<Person>().has_member("age", Compare::Equal, 3),
        Err(FramesError::InvalidSelector { .. })
    ));
}

#[test]
fn test_loop_then_frame() {
    let ctx = context();
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);

    let a = framed.add_vertex::<Person>().unwrap();
    let b = framed.add_vertex::<Person>().unwrap();
    let c = framed.add_vertex::<Project>().unwrap();
    let d = framed.add_vertex::<Person>().unwrap();
    framed.link::<Person>(a.id(), b.id(), "friends").unwrap();
    framed.link::<Person>(b.id(), c.id(), "friends").unwrap();
    framed.link::<Person>(b.id(), d.id(), "friends").unwrap();

    let step = |v: VertexId| out_vertices(&graph, v, Labels::of(["knows"]));
    let reached = loop_n(a.id(), step, 2)
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(reached, vec![c.id(), d.id()]);

    let people: Vec<Person> = framed
        .frame_all::<Person, _>(reached)
        .of_type()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(people, vec![d]);
}

#[test]
fn test_dictionary_registry_behind_a_context() {
    let models = models();
    let dictionary = DictionaryTypeRegistry::new(
        &FramesConfig::default(),
        &models,
        [(TypeName::of::<Person>(), 1), (TypeName::of::<Project>(), 2)],
    )
    .unwrap();
    let ctx = FramesContext::new(models, Arc::new(dictionary));
    let graph = MemoryGraph::new();
    let framed = ctx.bind(&graph);

    let person = framed.add_vertex::<Person>().unwrap();
    assert_eq!(
        graph.property(person.0, ctx.registry().type_property()).unwrap(),
        Some(Value::Long(1))
    );
    assert_eq!(framed.frame::<Person>(person.0).unwrap(), Some(person));
    assert!(matches!(
        framed.add_vertex::<Employee>(),
        Err(FramesError::UnregisteredType(_))
    ));
    // The failed creation left nothing behind and the dictionary wrote nothing.
    assert_eq!(graph.vertex_count(), 1);
    assert!(!ctx.release(&graph));
}
