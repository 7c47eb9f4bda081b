use anyhow::{Context, Result};
use regex::Captures;

use diagrammer_core::error::ScanError;
use diagrammer_core::patterns::{binding_names, group, PatternSet};
use diagrammer_core::scanner::{LanguageScanner, ScanResult};
use diagrammer_core::types::{Component, ComponentKind, Dependency, Locality, Module};

const LANGUAGE: &str = "javascript";

/// An import binding before it is tied to a file: `(local name, source, is_default)`.
type Binding = (String, String, bool);

fn default_import(caps: &Captures<'_>) -> Vec<Binding> {
    match (group(caps, 1), group(caps, 2)) {
        (Some(name), Some(source)) => vec![(name.to_string(), source.to_string(), true)],
        _ => Vec::new(),
    }
}

fn named_imports(caps: &Captures<'_>) -> Vec<Binding> {
    let (Some(list), Some(source)) = (group(caps, 1), group(caps, 2)) else {
        return Vec::new();
    };
    binding_names(list)
        .into_iter()
        .map(|name| (name, source.to_string(), false))
        .collect()
}

fn namespace_import(caps: &Captures<'_>) -> Vec<Binding> {
    match (group(caps, 1), group(caps, 2)) {
        (Some(name), Some(source)) => vec![(name.to_string(), source.to_string(), false)],
        _ => Vec::new(),
    }
}

fn single_name(caps: &Captures<'_>) -> Vec<String> {
    group(caps, 1).map(str::to_string).into_iter().collect()
}

fn name_list(caps: &Captures<'_>) -> Vec<String> {
    group(caps, 1).map(binding_names).unwrap_or_default()
}

fn declaration(caps: &Captures<'_>, kind: ComponentKind) -> Vec<(String, ComponentKind)> {
    group(caps, 1)
        .map(|name| vec![(name.to_string(), kind)])
        .unwrap_or_default()
}

fn class_declaration(caps: &Captures<'_>) -> Vec<(String, ComponentKind)> {
    declaration(caps, ComponentKind::Class)
}

fn function_declaration(caps: &Captures<'_>) -> Vec<(String, ComponentKind)> {
    declaration(caps, ComponentKind::Function)
}

fn function_assignment(caps: &Captures<'_>) -> Vec<(String, ComponentKind)> {
    declaration(caps, ComponentKind::ArrowFunction)
}

/// JavaScript/JSX scanner built from ordered regex passes.
///
/// Anything shaped like a declaration is reported, so comments and strings
/// can produce extra components.
pub struct JavaScriptScanner {
    imports: PatternSet<Binding>,
    exports: PatternSet<String>,
    declarations: PatternSet<(String, ComponentKind)>,
}

impl JavaScriptScanner {
    pub fn new() -> Result<Self> {
        let imports = PatternSet::new()
            .rule(
                r#"import\s+(\w+)\s*(?:,\s*\{[^}]*\}\s*)?from\s+['"]([^'"]+)['"]"#,
                default_import,
            )?
            .rule(
                r#"import\s+(?:\w+\s*,\s*)?\{\s*([^}]+?)\s*\}\s*from\s+['"]([^'"]+)['"]"#,
                named_imports,
            )?
            .rule(
                r#"import\s*\*\s+as\s+(\w+)\s+from\s+['"]([^'"]+)['"]"#,
                namespace_import,
            )?
            .rule(
                r#"(?:const|let|var)\s+(\w+)\s*=\s*require\(\s*['"]([^'"]+)['"]\s*\)"#,
                default_import,
            )
            .context("failed to compile import patterns")?;

        let exports = PatternSet::new()
            .rule(
                r"export\s+default\s+(?:async\s+)?(?:class\s+|function\s*\*?\s*)?(\w+)",
                single_name,
            )?
            .rule(
                r"export\s+(?:async\s+)?(?:const|let|var|function\*?|class)\s+(\w+)",
                single_name,
            )?
            .rule(r"export\s*\{\s*([^}]+?)\s*\}", name_list)?
            .rule(r"module\.exports\s*=\s*(\w+)", single_name)
            .context("failed to compile export patterns")?;

        let declarations = PatternSet::new()
            .rule(r"class\s+(\w+)", class_declaration)?
            .rule(r"function\s*\*?\s+(\w+)", function_declaration)?
            .rule(
                r"(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:\(|function\b)",
                function_assignment,
            )
            .context("failed to compile declaration patterns")?;

        Ok(Self {
            imports,
            exports,
            declarations,
        })
    }
}

impl LanguageScanner for JavaScriptScanner {
    fn language(&self) -> &'static str {
        LANGUAGE
    }

    fn file_extensions(&self) -> &[&str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn scan(&self, path: &str, content: &str) -> Result<ScanResult, ScanError> {
        let dependencies = self
            .imports
            .scan(content)
            .into_iter()
            .map(|(name, source, is_default)| Dependency {
                locality: Locality::of_relative(&source),
                name,
                from: source,
                path: path.to_string(),
                is_default,
            })
            .collect();

        let exports: Vec<String> = self.exports.scan(content);
        let components = self
            .declarations
            .scan(content)
            .into_iter()
            .map(|(name, kind)| {
                let exported = exports.contains(&name);
                Component::new(&name, path, kind, LANGUAGE).exported(exported)
            })
            .collect();

        let mut unique_exports = Vec::new();
        for name in exports {
            if !unique_exports.contains(&name) {
                unique_exports.push(name);
            }
        }

        Ok(ScanResult {
            components,
            dependencies,
            modules: vec![Module::for_file(path, LANGUAGE, unique_exports)],
        }
        .without_repeats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(path: &str, content: &str) -> ScanResult {
        JavaScriptScanner::new().unwrap().scan(path, content).unwrap()
    }

    #[test]
    fn test_four_import_shapes() {
        let content = r#"
import React from 'react';
import { useState, useEffect as useFx } from "react";
import * as utils from './utils';
const express = require('express');
"#;
        let result = scan("src/app.js", content);
        let deps: Vec<(&str, &str, bool)> = result
            .dependencies
            .iter()
            .map(|d| (d.name.as_str(), d.from.as_str(), d.is_default))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("React", "react", true),
                ("useState", "react", false),
                ("useFx", "react", false),
                ("utils", "./utils", false),
                ("express", "express", true),
            ]
        );
    }

    #[test]
    fn test_locality() {
        let result = scan(
            "src/app.js",
            "import helper from './utils';\nimport React from 'react';",
        );
        let helper = result.dependencies.iter().find(|d| d.name == "helper").unwrap();
        let react = result.dependencies.iter().find(|d| d.name == "React").unwrap();
        assert!(helper.is_local());
        assert!(react.is_external());
    }

    #[test]
    fn test_default_with_named_import() {
        let result = scan("src/a.jsx", "import React, { useState } from 'react';");
        let names: Vec<_> = result.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["React", "useState"]);
    }

    #[test]
    fn test_export_shapes() {
        let content = r#"
export default class App {}
export const api = () => {};
function a() {}
function b() {}
export { a, b as bee };
module.exports = Server;
"#;
        let result = scan("src/index.js", content);
        assert_eq!(
            result.modules[0].exports,
            vec!["App", "api", "a", "bee", "Server"]
        );
        assert_eq!(result.modules[0].name, "index");
    }

    #[test]
    fn test_components_and_export_flag() {
        let content = r#"
class UserStore {}
export function loadUsers() {}
const handler = async (req) => {};
"#;
        let result = scan("src/store.js", content);
        let found: Vec<(&str, ComponentKind, bool)> = result
            .components
            .iter()
            .map(|c| (c.name.as_str(), c.kind, c.is_exported))
            .collect();
        assert_eq!(
            found,
            vec![
                ("UserStore", ComponentKind::Class, false),
                ("loadUsers", ComponentKind::Function, true),
                ("handler", ComponentKind::ArrowFunction, false),
            ]
        );
    }

    #[test]
    fn test_coverage_over_precision() {
        // Declarations inside comments are still reported.
        let result = scan("src/notes.js", "// class Ghost would be nice\n");
        assert!(result.components.iter().any(|c| c.name == "Ghost"));
    }

    #[test]
    fn test_exact_repeats_collapse_within_file() {
        let content = "import a from './a';\nimport a from './a';\n";
        assert_eq!(scan("src/x.js", content).dependencies.len(), 1);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let content = "import a from './a';\nclass B {}\nexport default B;\n";
        assert_eq!(scan("src/b.js", content), scan("src/b.js", content));
    }

    #[test]
    fn test_accepts_extensions() {
        let scanner = JavaScriptScanner::new().unwrap();
        assert!(scanner.accepts("src/a.js"));
        assert!(scanner.accepts("src/a.jsx"));
        assert!(scanner.accepts("src/a.mjs"));
        assert!(!scanner.accepts("src/a.ts"));
        assert!(!scanner.accepts("build/a.js"));
    }
}
