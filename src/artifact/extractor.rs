//! 制品提取
//!
//! 对每种类型独立判断：文本中同时出现开/闭标记时，取「第一个开标记末尾」到「第一个闭标记开头」之间的内容并 trim。
//! 闭标记出现在开标记之前时仍按位置计算，区间倒置得到空串，不做纠正。

use crate::artifact::ArtifactKind;

/// 提取单一类型的制品；缺少任一标记时返回 None
pub fn extract_kind(text: &str, kind: ArtifactKind) -> Option<String> {
    let open = text.find(kind.open_marker())?;
    let close = text.find(kind.close_marker())?;
    let start = open + kind.open_marker().len();
    let body = text.get(start..close).unwrap_or("");
    Some(body.trim().to_string())
}

/// 提取全部三种制品（每种至多一个），顺序为 Bash、Python、SelfMod
pub fn extract(text: &str) -> Vec<(ArtifactKind, String)> {
    ArtifactKind::ALL
        .into_iter()
        .filter_map(|kind| extract_kind(text, kind).map(|body| (kind, body)))
        .collect()
}
