use crate::location::LocationConverter;
use anyhow::Result;
use std::path::Path;
use swc_common::{sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::Module;
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// A parsed module together with the converter for its positions
pub struct ParsedModule {
    pub module: Module,
    pub converter: LocationConverter,
}

/// TypeScript/JavaScript parser (via swc)
pub struct TypeScriptParser {
    source_map: SourceMap,
}

impl Default for TypeScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeScriptParser {
    pub fn new() -> Self {
        Self {
            source_map: SourceMap::default(),
        }
    }

    /// Parses in-memory source; the dialect follows the path's extension
    pub fn parse_source(&self, source: &str, path: &str) -> Result<ParsedModule> {
        let file_name: Lrc<FileName> = FileName::Real(Path::new(path).to_path_buf()).into();
        let fm = self
            .source_map
            .new_source_file(file_name, source.to_string());

        let lexer = Lexer::new(
            syntax_for(path),
            Default::default(),
            StringInput::from(&*fm),
            None,
        );
        let mut parser = Parser::new_from(lexer);

        let module = parser
            .parse_module()
            .map_err(|e| anyhow::anyhow!("Parse error: {:?}", e))?;

        Ok(ParsedModule {
            module,
            converter: LocationConverter::with_base(source.to_string(), fm.start_pos.0),
        })
    }
}

/// `.ts` → TypeScript, `.tsx` → TSX, anything else → JavaScript with JSX
pub fn syntax_for(path: &str) -> Syntax {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    match extension {
        "ts" | "mts" | "cts" => Syntax::Typescript(TsSyntax {
            decorators: true,
            ..Default::default()
        }),
        "tsx" => Syntax::Typescript(TsSyntax {
            tsx: true,
            decorators: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tsx_and_reports_lines() {
        let parser = TypeScriptParser::new();
        let source = "import React from 'react';\n\nexport function Page() {\n  return <div />;\n}\n";
        let parsed = parser.parse_source(source, "src/app/page.tsx").unwrap();
        assert_eq!(parsed.module.body.len(), 2);

        let swc_ecma_ast::ModuleItem::ModuleDecl(decl) = &parsed.module.body[1] else {
            panic!("expected export declaration");
        };
        assert_eq!(parsed.converter.line(swc_common::Spanned::span(decl).lo), 3);
    }

    #[test]
    fn positions_stay_file_relative_across_files() {
        let parser = TypeScriptParser::new();
        parser.parse_source("const a = 1;\nconst b = 2;\n", "src/a.ts").unwrap();
        let second = parser.parse_source("\n\nconst c = 3;\n", "src/c.ts").unwrap();
        let item = &second.module.body[0];
        assert_eq!(second.converter.line(swc_common::Spanned::span(item).lo), 3);
    }

    #[test]
    fn rejects_invalid_source() {
        let parser = TypeScriptParser::new();
        assert!(parser.parse_source("function (", "src/broken.ts").is_err());
    }

    #[test]
    fn javascript_accepts_jsx() {
        let parser = TypeScriptParser::new();
        assert!(parser
            .parse_source("export const A = () => <span>{1}</span>;", "src/a.jsx")
            .is_ok());
    }
}
