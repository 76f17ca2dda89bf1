//! OpenAPI generator: the program's API routes as an OpenAPI 3.0.0
//! document.
//!
//! Fixed top-level keys: `openapi: "3.0.0"`, `info: {title, version}`,
//! and `paths`. Each route becomes an entry keyed by its path with a
//! method-keyed object whose `responses."200"` schema derives from the
//! handler's declared return type. Primitives map to their JSON-schema
//! equivalents; named types become `$ref` entries into
//! `components/schemas`; unions become a `oneOf` of their constructor
//! shapes.

use indexmap::IndexSet;
use mkc_par::ast::*;
use mkc_util::Symbol;
use serde_json::{json, Map, Value};

/// Build the OpenAPI document for a program.
pub fn openapi_document(program: &Program) -> Value {
    let mut refs: IndexSet<Symbol> = IndexSet::new();
    let mut paths = Map::new();

    for route in &program.routes {
        let schema = schema_for(&route.ret_type, &mut refs);
        let operation = json!({
            "responses": {
                "200": {
                    "description": "Successful response",
                    "content": {
                        "application/json": {
                            "schema": schema
                        }
                    }
                }
            }
        });

        let entry = paths
            .entry(route.path.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = entry {
            methods.insert(route.method.as_lower().to_string(), operation);
        }
    }

    let mut document = json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Manaknight API",
            "version": "1.0.0"
        },
        "paths": paths
    });

    let schemas = components(program, refs);
    if !schemas.is_empty() {
        document["components"] = json!({ "schemas": schemas });
    }

    document
}

/// Serialize the document UTF-8, two-space indented, with a trailing
/// newline.
pub fn openapi_json(program: &Program) -> String {
    let mut out = serde_json::to_string_pretty(&openapi_document(program))
        .expect("openapi document serializes");
    out.push('\n');
    out
}

/// Resolve `$ref`ed named types into a `components/schemas` table. Record
/// and union bodies may reference further named types; the worklist runs
/// until closed.
fn components(program: &Program, mut refs: IndexSet<Symbol>) -> Map<String, Value> {
    let mut schemas = Map::new();
    let mut done: IndexSet<Symbol> = IndexSet::new();

    while let Some(name) = refs.iter().find(|n| !done.contains(*n)).copied() {
        done.insert(name);

        let Some(decl) = find_type_decl(program, name) else {
            continue;
        };
        let schema = match &decl.body {
            TypeBody::Record(fields) => object_schema(fields, None, &mut refs),
            TypeBody::Union(ctors) => {
                let shapes: Vec<Value> = ctors
                    .iter()
                    .map(|ctor| object_schema(&ctor.fields, Some(ctor.name), &mut refs))
                    .collect();
                json!({ "oneOf": shapes })
            }
        };
        schemas.insert(name.to_string(), schema);
    }

    schemas
}

fn find_type_decl(program: &Program, name: Symbol) -> Option<&TypeDecl> {
    program.all_decls().find_map(|decl| match decl {
        Decl::Type(type_decl) if type_decl.name == name => Some(type_decl),
        _ => None,
    })
}

/// An object schema from labeled fields, optionally tagged as a union
/// constructor shape.
fn object_schema(fields: &[FieldDef], tag: Option<Symbol>, refs: &mut IndexSet<Symbol>) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    if let Some(tag) = tag {
        properties.insert(
            "tag".to_string(),
            json!({ "type": "string", "enum": [tag.to_string()] }),
        );
        required.push(Value::String("tag".to_string()));
    }
    for field in fields {
        properties.insert(field.name.to_string(), schema_for(&field.ty, refs));
        required.push(Value::String(field.name.to_string()));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// JSON schema for a type expression, collecting named-type references.
fn schema_for(ty: &TypeExpr, refs: &mut IndexSet<Symbol>) -> Value {
    match ty {
        TypeExpr::Primitive(prim, _) => match prim {
            PrimitiveType::Int => json!({ "type": "integer" }),
            PrimitiveType::Bool => json!({ "type": "boolean" }),
            PrimitiveType::String => json!({ "type": "string" }),
            // OpenAPI 3.0 has no null type; Unit is an unconstrained
            // (empty) schema.
            PrimitiveType::Unit => json!({}),
        },
        TypeExpr::Named { name, .. } => {
            refs.insert(*name);
            json!({ "$ref": format!("#/components/schemas/{name}") })
        }
        TypeExpr::Generic { name, args, .. } => match (name.as_str(), args.as_slice()) {
            ("Option", [inner]) => {
                let mut schema = schema_for(inner, refs);
                if let Value::Object(map) = &mut schema {
                    map.insert("nullable".to_string(), Value::Bool(true));
                }
                schema
            }
            ("List", [inner]) => json!({ "type": "array", "items": schema_for(inner, refs) }),
            ("Map", [_, value]) => {
                json!({ "type": "object", "additionalProperties": schema_for(value, refs) })
            }
            ("Result", [ok, error]) => {
                json!({ "oneOf": [schema_for(ok, refs), schema_for(error, refs)] })
            }
            _ => {
                refs.insert(*name);
                json!({ "$ref": format!("#/components/schemas/{name}") })
            }
        },
        TypeExpr::Function { .. } => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkc_lex::Lexer;
    use mkc_par::Parser;
    use mkc_util::{FileId, Handler};

    fn document(src: &str) -> Value {
        let handler = Handler::new();
        let tokens = Lexer::new(src, FileId::DUMMY, &handler).tokenize();
        let program = Parser::new(tokens, &handler).parse();
        assert!(
            !handler.has_errors(),
            "fixture failed to parse: {:?}",
            handler.diagnostics()
        );
        openapi_document(&program)
    }

    /// A program without routes still yields a document with empty
    /// `paths`.
    #[test]
    fn program_without_routes_has_empty_paths() {
        let doc = document(r#"fn main() -> String { "hello" }"#);
        assert_eq!(doc["openapi"], "3.0.0");
        assert_eq!(doc["info"]["title"], "Manaknight API");
        assert_eq!(doc["info"]["version"], "1.0.0");
        assert_eq!(doc["paths"], json!({}));
    }

    /// `/ping` gets a `get` operation whose 200 schema is a string.
    #[test]
    fn ping_route_maps_to_string_schema() {
        let doc = document(r#"api get "/ping" () -> String { "pong" }"#);
        let schema =
            &doc["paths"]["/ping"]["get"]["responses"]["200"]["content"]["application/json"]["schema"];
        assert_eq!(schema, &json!({ "type": "string" }));
    }

    #[test]
    fn primitive_return_types_map_to_json_schema_equivalents() {
        let doc = document(
            r#"
            api get "/count" () -> Int { 0 }
            api get "/flag" () -> Bool { true }
            "#,
        );
        assert_eq!(
            doc["paths"]["/count"]["get"]["responses"]["200"]["content"]["application/json"]
                ["schema"],
            json!({ "type": "integer" })
        );
        assert_eq!(
            doc["paths"]["/flag"]["get"]["responses"]["200"]["content"]["application/json"]
                ["schema"],
            json!({ "type": "boolean" })
        );
    }

    #[test]
    fn methods_on_the_same_path_share_one_entry() {
        let doc = document(
            r#"
            api get "/items" () -> String { "list" }
            api post "/items" () -> String { "created" }
            "#,
        );
        let entry = &doc["paths"]["/items"];
        assert!(entry.get("get").is_some());
        assert!(entry.get("post").is_some());
    }

    #[test]
    fn named_return_types_become_component_refs() {
        let doc = document(
            r#"
            type User = { id: Int, name: String }
            api get "/me" () -> User { find() }
            fn find() -> User { find() }
            "#,
        );
        let schema =
            &doc["paths"]["/me"]["get"]["responses"]["200"]["content"]["application/json"]["schema"];
        assert_eq!(schema, &json!({ "$ref": "#/components/schemas/User" }));

        let user = &doc["components"]["schemas"]["User"];
        assert_eq!(user["type"], "object");
        assert_eq!(user["properties"]["id"], json!({ "type": "integer" }));
        assert_eq!(user["properties"]["name"], json!({ "type": "string" }));
    }

    #[test]
    fn union_types_become_one_of_constructor_shapes() {
        let doc = document(
            r#"
            type Status = Active | Suspended(reason: String)
            api get "/status" () -> Status { Active }
            "#,
        );
        let status = &doc["components"]["schemas"]["Status"];
        let one_of = status["oneOf"].as_array().unwrap();
        assert_eq!(one_of.len(), 2);
        assert_eq!(one_of[0]["properties"]["tag"]["enum"], json!(["Active"]));
        assert_eq!(
            one_of[1]["properties"]["reason"],
            json!({ "type": "string" })
        );
    }

    #[test]
    fn list_and_map_returns_map_to_container_schemas() {
        let doc = document(
            r#"
            api get "/names" () -> List<String> { names() }
            fn names() -> List<String> { names() }
            "#,
        );
        assert_eq!(
            doc["paths"]["/names"]["get"]["responses"]["200"]["content"]["application/json"]
                ["schema"],
            json!({ "type": "array", "items": { "type": "string" } })
        );
    }

    #[test]
    fn serialized_document_is_two_space_indented() {
        let handler = Handler::new();
        let tokens = Lexer::new(
            r#"api get "/ping" () -> String { "pong" }"#,
            FileId::DUMMY,
            &handler,
        )
        .tokenize();
        let program = Parser::new(tokens, &handler).parse();
        let text = openapi_json(&program);
        assert!(text.starts_with("{\n  \"openapi\": \"3.0.0\","), "{text}");
        assert!(text.ends_with("}\n"), "{text}");
    }
}
