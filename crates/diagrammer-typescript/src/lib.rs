use anyhow::{Context, Result};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

use diagrammer_core::error::ScanError;
use diagrammer_core::scanner::{LanguageScanner, ScanResult};
use diagrammer_core::types::{Component, ComponentKind, Dependency, Locality, Module};

const LANGUAGE: &str = "typescript";

/// Holds queries compiled for a specific TypeScript dialect.
struct QuerySet {
    declaration_query: Query,
    import_query: Query,
    export_query: Query,
}

const DECLARATION_QUERY_SRC: &str = r#"
(class_declaration name: (type_identifier) @class)
(abstract_class_declaration name: (type_identifier) @class)
(interface_declaration name: (type_identifier) @interface)
(function_declaration name: (identifier) @function)
(generator_function_declaration name: (identifier) @function)
(variable_declarator name: (identifier) @variable)
"#;

const IMPORT_QUERY_SRC: &str = r#"
(import_statement
  source: (string) @source) @import
"#;

const EXPORT_QUERY_SRC: &str = r#"
(export_statement) @export
"#;

fn compile_queries(language: &Language) -> Result<QuerySet> {
    Ok(QuerySet {
        declaration_query: Query::new(language, DECLARATION_QUERY_SRC)
            .context("failed to compile declaration query")?,
        import_query: Query::new(language, IMPORT_QUERY_SRC)
            .context("failed to compile import query")?,
        export_query: Query::new(language, EXPORT_QUERY_SRC)
            .context("failed to compile export query")?,
    })
}

/// TypeScript/TSX scanner using tree-sitter.
pub struct TypeScriptScanner {
    ts_language: Language,
    tsx_language: Language,
    ts_queries: QuerySet,
    tsx_queries: QuerySet,
}

impl TypeScriptScanner {
    pub fn new() -> Result<Self> {
        let ts_language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let tsx_language: Language = tree_sitter_typescript::LANGUAGE_TSX.into();

        let ts_queries = compile_queries(&ts_language)?;
        let tsx_queries = compile_queries(&tsx_language)?;

        Ok(Self {
            ts_language,
            tsx_language,
            ts_queries,
            tsx_queries,
        })
    }

    fn dialect(&self, path: &str) -> (&Language, &QuerySet) {
        if path.ends_with(".tsx") {
            (&self.tsx_language, &self.tsx_queries)
        } else {
            (&self.ts_language, &self.ts_queries)
        }
    }

    fn parse(&self, path: &str, content: &str) -> Result<Tree, ScanError> {
        let (language, _) = self.dialect(path);
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|e| ScanError::parse(path, format!("failed to set TypeScript language: {e}")))?;
        parser
            .parse(content, None)
            .ok_or_else(|| ScanError::parse(path, "parser produced no syntax tree"))
    }
}

impl LanguageScanner for TypeScriptScanner {
    fn language(&self) -> &'static str {
        LANGUAGE
    }

    fn file_extensions(&self) -> &[&str] {
        &["ts", "tsx"]
    }

    fn accepts(&self, path: &str) -> bool {
        if path.ends_with(".d.ts") {
            return false;
        }
        let normalized = path.replace('\\', "/");
        let mut segments: Vec<&str> = normalized.split('/').collect();
        let Some(file_name) = segments.pop() else {
            return false;
        };
        !segments.iter().any(|s| self.excluded_dirs().contains(s))
            && (file_name.ends_with(".ts") || file_name.ends_with(".tsx"))
            && !file_name.starts_with('.')
    }

    fn scan(&self, path: &str, content: &str) -> Result<ScanResult, ScanError> {
        if path.ends_with(".d.ts") {
            return Ok(ScanResult::default());
        }
        let tree = self.parse(path, content)?;
        let (_, queries) = self.dialect(path);

        let mut dependencies = extract_imports(&queries.import_query, &tree, path, content);
        let exports = extract_exports(
            &queries.export_query,
            &tree,
            path,
            content,
            &mut dependencies,
        );
        let components = extract_components(&queries.declaration_query, &tree, path, content);

        Ok(ScanResult {
            components,
            dependencies,
            modules: vec![Module::for_file(path, LANGUAGE, exports)],
        }
        .without_repeats())
    }
}

fn extract_components(query: &Query, tree: &Tree, path: &str, src: &str) -> Vec<Component> {
    let names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), src.as_bytes());
    let mut components = Vec::new();

    while let Some(m) = matches.next() {
        for capture in m.captures {
            let Some(decl) = capture.node.parent() else {
                continue;
            };
            let kind = match names[capture.index as usize] {
                "class" => ComponentKind::Class,
                "interface" => ComponentKind::Interface,
                "function" => ComponentKind::Function,
                "variable" => variable_kind(decl),
                _ => continue,
            };
            let name = node_text(capture.node, src);
            components.push(Component::new(&name, path, kind, LANGUAGE).exported(is_exported(decl)));
        }
    }

    components
}

/// Declarators bound to a function value count as arrow functions.
fn variable_kind(declarator: Node) -> ComponentKind {
    match declarator.child_by_field_name("value").map(|v| v.kind()) {
        Some("arrow_function" | "function_expression" | "function") => ComponentKind::ArrowFunction,
        _ => ComponentKind::Variable,
    }
}

/// Whether the declaration sits directly under an `export` statement.
fn is_exported(decl: Node) -> bool {
    let mut current = decl.parent();
    while let Some(node) = current {
        match node.kind() {
            "export_statement" => return true,
            "program" | "statement_block" | "class_body" => return false,
            _ => current = node.parent(),
        }
    }
    false
}

fn extract_imports(query: &Query, tree: &Tree, path: &str, src: &str) -> Vec<Dependency> {
    let names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), src.as_bytes());
    let mut deps = Vec::new();

    while let Some(m) = matches.next() {
        let mut import = None;
        let mut source = None;
        for capture in m.captures {
            match names[capture.index as usize] {
                "import" => import = Some(capture.node),
                "source" => source = Some(unquote(&node_text(capture.node, src))),
                _ => {}
            }
        }
        let (Some(import), Some(source)) = (import, source) else {
            continue;
        };

        let bindings = import_bindings(import, src);
        if bindings.is_empty() {
            // Side-effect import: the module itself is the dependency.
            deps.push(dependency(&source, &source, path, false));
        }
        for (name, is_default) in bindings {
            deps.push(dependency(&name, &source, path, is_default));
        }
    }

    deps
}

/// Local names bound by an import clause, flagged when they are default imports.
fn import_bindings(import: Node, src: &str) -> Vec<(String, bool)> {
    let mut out = Vec::new();
    let mut cursor = import.walk();
    let Some(clause) = import
        .named_children(&mut cursor)
        .find(|c| c.kind() == "import_clause")
    else {
        return out;
    };

    let mut clause_cursor = clause.walk();
    for child in clause.named_children(&mut clause_cursor) {
        match child.kind() {
            "identifier" => out.push((node_text(child, src), true)),
            "namespace_import" => {
                let mut c = child.walk();
                if let Some(id) = child.named_children(&mut c).find(|n| n.kind() == "identifier") {
                    out.push((node_text(id, src), false));
                };
            }
            "named_imports" => {
                let mut c = child.walk();
                for spec in child
                    .named_children(&mut c)
                    .filter(|n| n.kind() == "import_specifier")
                {
                    let local = spec
                        .child_by_field_name("alias")
                        .or_else(|| spec.child_by_field_name("name"));
                    if let Some(local) = local {
                        out.push((node_text(local, src), false));
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// Exported names in source order. Re-exports with a `from` also add dependencies.
fn extract_exports(
    query: &Query,
    tree: &Tree,
    path: &str,
    src: &str,
    deps: &mut Vec<Dependency>,
) -> Vec<String> {
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), src.as_bytes());
    let mut exports = Vec::new();

    while let Some(m) = matches.next() {
        for capture in m.captures {
            let node = capture.node;
            let source = node
                .child_by_field_name("source")
                .map(|s| unquote(&node_text(s, src)));

            if let Some(decl) = node.child_by_field_name("declaration") {
                exports.extend(declaration_names(decl, src));
                continue;
            }

            let mut c = node.walk();
            let clause = node
                .named_children(&mut c)
                .find(|n| n.kind() == "export_clause");
            if let Some(clause) = clause {
                let mut cc = clause.walk();
                for spec in clause
                    .named_children(&mut cc)
                    .filter(|n| n.kind() == "export_specifier")
                {
                    let Some(name) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let exported = spec.child_by_field_name("alias").unwrap_or(name);
                    exports.push(node_text(exported, src));
                    if let Some(source) = &source {
                        deps.push(dependency(&node_text(name, src), source, path, false));
                    }
                }
                continue;
            }

            if let Some(value) = node.child_by_field_name("value") {
                if value.kind() == "identifier" {
                    exports.push(node_text(value, src));
                }
            }
        }
    }

    exports
}

fn declaration_names(decl: Node, src: &str) -> Vec<String> {
    match decl.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut c = decl.walk();
            decl.named_children(&mut c)
                .filter(|n| n.kind() == "variable_declarator")
                .filter_map(|d| d.child_by_field_name("name"))
                .filter(|n| n.kind() == "identifier")
                .map(|n| node_text(n, src))
                .collect()
        }
        _ => decl
            .child_by_field_name("name")
            .map(|n| node_text(n, src))
            .into_iter()
            .collect(),
    }
}

fn dependency(name: &str, source: &str, path: &str, is_default: bool) -> Dependency {
    Dependency {
        name: name.to_string(),
        from: source.to_string(),
        path: path.to_string(),
        is_default,
        locality: Locality::of_relative(source),
    }
}

/// Extract text from a tree-sitter node.
fn node_text(node: Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}

fn unquote(raw: &str) -> String {
    raw.trim_matches(|c: char| c == '"' || c == '\'' || c == '`').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(path: &str, content: &str) -> ScanResult {
        TypeScriptScanner::new().unwrap().scan(path, content).unwrap()
    }

    #[test]
    fn test_extracts_declarations_in_order() {
        let content = r#"
export interface User {
    id: string;
}

export class UserService {
    constructor(private repo: UserRepository) {}
}

abstract class BaseRepo {}

export function createUser(name: string): User {
    return { id: name };
}

export const formatUser = (u: User) => u.id;
const count = 3;
"#;
        let result = scan("src/services/UserService.ts", content);
        let found: Vec<(&str, ComponentKind, bool)> = result
            .components
            .iter()
            .map(|c| (c.name.as_str(), c.kind, c.is_exported))
            .collect();
        assert_eq!(
            found,
            vec![
                ("User", ComponentKind::Interface, true),
                ("UserService", ComponentKind::Class, true),
                ("BaseRepo", ComponentKind::Class, false),
                ("createUser", ComponentKind::Function, true),
                ("formatUser", ComponentKind::ArrowFunction, true),
                ("count", ComponentKind::Variable, false),
            ]
        );
        assert!(result.components.iter().all(|c| c.language == "typescript"));
    }

    #[test]
    fn test_extract_imports() {
        let content = r#"
import React from 'react';
import { User, UserRepository as Repo } from '../domain/user';
import * as path from "path";
import './styles.css';
"#;
        let result = scan("src/infrastructure/repo.ts", content);
        let deps: Vec<(&str, &str, bool, Locality)> = result
            .dependencies
            .iter()
            .map(|d| (d.name.as_str(), d.from.as_str(), d.is_default, d.locality))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("React", "react", true, Locality::External),
                ("User", "../domain/user", false, Locality::Local),
                ("Repo", "../domain/user", false, Locality::Local),
                ("path", "path", false, Locality::External),
                ("./styles.css", "./styles.css", false, Locality::Local),
            ]
        );
    }

    #[test]
    fn test_module_exports() {
        let content = r#"
export class App {}
export interface Props {}
export const a = 1, b = 2;
function helper() {}
export { helper as util };
export { User } from './models/User';
export default helper;
"#;
        let result = scan("src/index.ts", content);
        assert_eq!(result.modules.len(), 1);
        let module = &result.modules[0];
        assert_eq!(module.name, "index");
        assert_eq!(
            module.exports,
            vec!["App", "Props", "a", "b", "util", "User", "helper"]
        );
        assert!(result
            .dependencies
            .iter()
            .any(|d| d.name == "User" && d.from == "./models/User"));
    }

    #[test]
    fn test_parse_tsx_file() {
        let content = r#"
import React from 'react';

interface Props {
    name: string;
}

export const Header = ({ name }: Props) => <h1>{name}</h1>;
"#;
        let result = scan("src/components/Header.tsx", content);
        assert!(result.components.iter().any(|c| c.name == "Props"));
        let header = result.components.iter().find(|c| c.name == "Header").unwrap();
        assert_eq!(header.kind, ComponentKind::ArrowFunction);
        assert!(header.is_exported);
    }

    #[test]
    fn test_declaration_files_skipped() {
        let scanner = TypeScriptScanner::new().unwrap();
        assert!(!scanner.accepts("src/types.d.ts"));
        assert!(scanner.accepts("src/types.ts"));
        assert!(scanner.accepts("src/App.tsx"));
        assert!(!scanner.accepts("node_modules/x/index.ts"));
        let result = scanner.scan("src/types.d.ts", "declare const x: number;").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_scan_is_idempotent() {
        let content = "import { A } from './a';\nexport class B extends A {}\n";
        assert_eq!(scan("src/b.ts", content), scan("src/b.ts", content));
    }

    #[test]
    fn test_malformed_source_still_yields_module() {
        let result = scan("src/broken.ts", "export class {{{ import from");
        assert_eq!(result.modules.len(), 1);
    }

    #[test]
    fn test_repeated_import_recorded_once() {
        let content = "import { A } from './a';\nimport { A } from './a';\n";
        let result = scan("src/b.ts", content);
        assert_eq!(result.dependencies.len(), 1);
    }
}
