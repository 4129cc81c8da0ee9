//! IR を JavaScript モジュールのテキストに整形する。

use serde_json::Value;

use super::{DataFields, GeneratedRoutes, LazyWiring, LegacyFields, Reference, RouteFields, RouteObject};

/// JSON の文字列リテラルは JS の文字列リテラルとしてもそのまま使える
fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn create_element(reference: &Reference) -> String {
    format!("React.createElement({}.{})", reference.binding, reference.export)
}

fn constant(reference: &Reference) -> String {
    format!("{}.{}", reference.binding, reference.export)
}

pub fn render_imports(routes: &GeneratedRoutes) -> String {
    routes
        .imports
        .iter()
        .map(|import| format!("import * as {} from {};", import.ident, js_string(&import.source)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_routes(routes: &[RouteObject]) -> String {
    let objects: Vec<String> = routes.iter().map(render_route).collect();
    format!("[{}]", objects.join(","))
}

/// 生成モジュール全体。`routes` を export する
pub fn render_module(routes: &GeneratedRoutes) -> String {
    let mut out = String::from("import React from 'react';\n");
    let imports = render_imports(routes);
    if !imports.is_empty() {
        out.push_str(&imports);
        out.push('\n');
    }
    out.push_str(&format!("export const routes = {};\n", render_routes(&routes.routes)));
    out
}

fn render_route(route: &RouteObject) -> String {
    let mut props: Vec<(&str, String)> = Vec::new();

    if let Some(path) = &route.path {
        props.push(("path", js_string(path)));
    }
    props.push(("id", js_string(&route.id)));
    props.push(("index", route.index.to_string()));
    if route.case_sensitive {
        props.push(("caseSensitive", "true".to_string()));
    }

    match &route.fields {
        RouteFields::DataApi(fields) => push_data_fields(&mut props, fields),
        RouteFields::Legacy(fields) => push_legacy_fields(&mut props, fields),
    }

    if !route.children.is_empty() {
        props.push(("children", render_routes(&route.children)));
    }

    let body: Vec<String> = props.into_iter().map(|(k, v)| format!("{k}:{v}")).collect();
    format!("{{{}}}", body.join(","))
}

fn push_data_fields(props: &mut Vec<(&str, String)>, fields: &DataFields) {
    match &fields.lazy {
        Some(LazyWiring::DefaultExport { source }) => props.push((
            "lazy",
            format!(
                "async () => {{ const {{ default: Component, ...rest }} = await import({}); return {{ Component, ...rest }}; }}",
                js_string(source)
            ),
        )),
        Some(LazyWiring::Export(reference)) => props.push(("lazy", constant(reference))),
        None => {}
    }

    let elements = [("element", &fields.element), ("errorElement", &fields.error_element)];
    for (key, value) in elements {
        if let Some(reference) = value {
            props.push((key, create_element(reference)));
        }
    }

    let constants = [
        ("loader", &fields.loader),
        ("action", &fields.action),
        ("handle", &fields.handle),
        ("shouldRevalidate", &fields.should_revalidate),
    ];
    for (key, value) in constants {
        if let Some(reference) = value {
            props.push((key, constant(reference)));
        }
    }
}

fn push_legacy_fields(props: &mut Vec<(&str, String)>, fields: &LegacyFields) {
    if let Some(meta) = &fields.meta {
        props.push(("meta", meta.clone()));
    }
    if let Some(source) = &fields.lazy_component {
        props.push(("lazyComponent", format!("() => import({})", js_string(source))));
    } else if let Some(reference) = &fields.element {
        props.push(("element", create_element(reference)));
    }
}
