use serde_json::{Map, Value};

/// ルートごとのメタ情報 (route の handle 相当のオブジェクト)
pub type Meta = Map<String, Value>;

/// 祖先から受け継いだメタ情報に、ルート自身のメタ情報を重ねる。キーが重なれば子が勝つ
pub fn collect_meta(inherited: &Meta, own: &Meta) -> Meta {
    let mut meta = inherited.clone();
    for (key, value) in own {
        meta.insert(key.clone(), value.clone());
    }
    meta
}
