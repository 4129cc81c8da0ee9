use swc_common::{sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, Parser as SwcParser, StringInput, Syntax, TsConfig};
use swc_ecma_visit::{Visit, VisitWith};
use std::collections::HashSet;
use path_absolutize::Absolutize;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::model::ModuleExports;
use crate::resolver::{is_relative_specifier, resolve_relative_module};

/// モジュールの AST をトラバースして実行時 export 名を集める Visitor
#[derive(Default)]
struct ExportVisitor {
    /// 見つかった export 名
    names: Vec<String>,
    /// `export * from "..."` の specifier (後で再帰的に解決する)
    star_sources: Vec<String>,
}

impl ExportVisitor {
    fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    /// 分割代入パターンを含む束縛名を集める
    /// 例: `export const { loader, action: act } = handlers` → loader, act
    fn collect_pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(BindingIdent { id, .. }) => self.push(id.sym.to_string()),
            Pat::Array(ArrayPat { elems, .. }) => {
                for elem in elems.iter().flatten() {
                    self.collect_pat(elem);
                }
            }
            Pat::Object(ObjectPat { props, .. }) => {
                for prop in props {
                    match prop {
                        ObjectPatProp::KeyValue(KeyValuePatProp { value, .. }) => self.collect_pat(value),
                        ObjectPatProp::Assign(AssignPatProp { key, .. }) => self.push(key.sym.to_string()),
                        ObjectPatProp::Rest(RestPat { arg, .. }) => self.collect_pat(arg),
                    }
                }
            }
            Pat::Rest(RestPat { arg, .. }) => self.collect_pat(arg),
            Pat::Assign(AssignPat { left, .. }) => self.collect_pat(left),
            _ => {}
        }
    }

    fn collect_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Class(ClassDecl { ident, declare, .. }) if !declare => self.push(ident.sym.to_string()),
            Decl::Fn(FnDecl { ident, declare, .. }) if !declare => self.push(ident.sym.to_string()),
            Decl::Var(var) if !var.declare => {
                for declarator in &var.decls {
                    self.collect_pat(&declarator.name);
                }
            }
            Decl::TsEnum(ts_enum) if !ts_enum.declare => self.push(ts_enum.id.sym.to_string()),
            // interface / type / declare は実行時には存在しない
            _ => {}
        }
    }
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s.value.to_string(),
    }
}

impl Visit for ExportVisitor {
    fn visit_module_decl(&mut self, decl: &ModuleDecl) {
        match decl {
            ModuleDecl::ExportDecl(ExportDecl { decl, .. }) => self.collect_decl(decl),
            // `export default interface` は型だけ
            ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
                decl: DefaultDecl::TsInterfaceDecl(_),
                ..
            }) => {}
            ModuleDecl::ExportDefaultDecl(_) | ModuleDecl::ExportDefaultExpr(_) => self.push("default"),
            ModuleDecl::ExportNamed(named) if !named.type_only => {
                for spec in &named.specifiers {
                    match spec {
                        ExportSpecifier::Named(ExportNamedSpecifier {
                            orig,
                            exported,
                            is_type_only,
                            ..
                        }) => {
                            if *is_type_only {
                                continue;
                            }
                            // `export { a as b }` なら公開名は b
                            let name = exported.as_ref().unwrap_or(orig);
                            self.push(export_name(name));
                        }
                        ExportSpecifier::Default(ExportDefaultSpecifier { exported }) => {
                            self.push(exported.sym.to_string());
                        }
                        ExportSpecifier::Namespace(ExportNamespaceSpecifier { name, .. }) => {
                            self.push(export_name(name));
                        }
                    }
                }
            }
            ModuleDecl::ExportAll(all) if !all.type_only => {
                self.star_sources.push(all.src.value.to_string());
            }
            _ => {}
        }
    }
}

/// 拡張子から構文設定を決める。.ts だけは `<T>x` 型アサーションのため tsx を無効にする
fn syntax_for(file_path: &Path) -> Syntax {
    let tsx = !matches!(
        file_path.extension().and_then(|e| e.to_str()),
        Some("ts" | "mts" | "cts")
    );
    Syntax::Typescript(TsConfig {
        tsx,
        decorators: true,
        dts: false,
        no_early_errors: true,
        disallow_ambiguous_jsx_like: false,
    })
}

/// 1 ファイルだけを解析し、直接の export 名と `export *` の specifier を返す
fn parse_single_module(file_path: &Path) -> Result<ExportVisitor> {
    trace!(file = %file_path.display(), "ファイル解析開始");

    let src = fs::read_to_string(file_path).map_err(|e| Error::ModuleEvaluation {
        path: file_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Real(file_path.to_path_buf()), src);

    let lexer = Lexer::new(
        syntax_for(file_path),
        Default::default(), // es version
        StringInput::from(&*fm),
        None,
    );

    let mut parser = SwcParser::new_from(lexer);
    let module = parser.parse_module().map_err(|e| Error::ModuleEvaluation {
        path: file_path.to_path_buf(),
        reason: format!("Parse error: {:?}", e.kind()),
    })?;

    let mut visitor = ExportVisitor::default();
    module.visit_with(&mut visitor);
    Ok(visitor)
}

/// ファイルの実行時 export 名を集める。
///
/// `export * from "./x"` は相対指定に限り再帰的に解決し、default を除いた export を取り込む。
/// 循環参照は一度訪れたファイルを再訪しないことで打ち切る。
pub fn parse_module_exports(file_path: &Path) -> Result<ModuleExports> {
    let mut visited = HashSet::new();
    let file_path = file_path.absolutize()?;
    collect_exports(&file_path, &mut visited, true)
}

fn collect_exports(file_path: &Path, visited: &mut HashSet<PathBuf>, include_default: bool) -> Result<ModuleExports> {
    let mut exports = ModuleExports::new();
    if !visited.insert(file_path.to_path_buf()) {
        return Ok(exports);
    }

    let visitor = parse_single_module(file_path)?;
    exports.extend(
        visitor
            .names
            .into_iter()
            .filter(|name| include_default || name != "default"),
    );

    for specifier in &visitor.star_sources {
        match resolve_relative_module(specifier, file_path)? {
            Some(target) => {
                let nested = collect_exports(&target, visited, false)?;
                exports.extend(nested.iter().map(str::to_string));
            }
            // 相対指定が実在しないなら import 自体が失敗する
            None if is_relative_specifier(specifier) => {
                return Err(Error::ModuleEvaluation {
                    path: file_path.to_path_buf(),
                    reason: format!("cannot resolve '{specifier}'"),
                });
            }
            None => {
                debug!(file = %file_path.display(), specifier = %specifier, "export * の解決をスキップ");
            }
        }
    }

    Ok(exports)
}
