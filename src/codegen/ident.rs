use heck::ToTitleCase;
use std::collections::HashSet;

/// 生成モジュール冒頭の `import React from 'react'` が使う識別子
const RESERVED: [&str; 1] = ["React"];

/// ルート ID を Pascal_Snake 形式の識別子に変換する。
///
/// 例: `routes/_index` → `Routes_Index`, `routes/$id.edit` → `Routes_Id_Edit`
pub fn pascal_snake_case(id: &str) -> String {
    let ident = id.to_title_case().replace(' ', "_");
    if ident.is_empty() {
        return "Route".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{ident}");
    }
    ident
}

/// import 識別子の割り当て。同じ識別子が既に使われていれば `_2`, `_3`, ... を付ける
#[derive(Debug)]
pub struct IdentAllocator {
    used: HashSet<String>,
}

impl Default for IdentAllocator {
    fn default() -> Self {
        Self {
            used: RESERVED.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl IdentAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
