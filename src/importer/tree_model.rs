// ==========================================
// 品质保证监控看板 - 树模型 dump 特征分裂频次
// ==========================================
// 输入: 梯度提升树模型 JSON dump
//   learner.feature_names                      特征名（有序）
//   learner.gradient_booster.model.trees[]     决策树
//     split_indices / left_children / right_children（平行数组）
// 输出: 每个特征在内部节点上的分裂占比，降序
// ==========================================

use crate::domain::CategoryEntry;
use serde_json::Value;

const FEATURE_NAMES_PTR: &str = "/learner/feature_names";
const TREES_PTR: &str = "/learner/gradient_booster/model/trees";

/// 叶子节点的子节点标记
const NO_CHILD: i64 = -1;

/// 判断是否为树模型 dump 结构
pub fn looks_like_tree_dump(json: &Value) -> bool {
    json.pointer(FEATURE_NAMES_PTR).map(Value::is_array).unwrap_or(false)
        && json.pointer(TREES_PTR).map(Value::is_array).unwrap_or(false)
}

/// 计算特征分裂频次占比
///
/// # 返回
/// - Some(entries): 每个特征一项，占比之和为 1（保留 4 位小数），按占比降序
/// - None: 结构不匹配，或所有树都没有内部节点
pub fn extract_split_frequency(json: &Value) -> Option<Vec<CategoryEntry>> {
    let names = json.pointer(FEATURE_NAMES_PTR)?.as_array()?;
    let trees = json.pointer(TREES_PTR)?.as_array()?;

    let mut counts = vec![0u64; names.len()];

    for tree in trees {
        let (Some(splits), Some(left), Some(right)) = (
            int_array(tree, "split_indices"),
            int_array(tree, "left_children"),
            int_array(tree, "right_children"),
        ) else {
            continue;
        };

        for (node, feature_idx) in splits.iter().enumerate() {
            let is_internal = matches!(
                (left.get(node), right.get(node)),
                (Some(l), Some(r)) if *l != NO_CHILD && *r != NO_CHILD
            );
            if !is_internal {
                continue;
            }
            if let Ok(idx) = usize::try_from(*feature_idx) {
                if let Some(slot) = counts.get_mut(idx) {
                    *slot += 1;
                }
            }
        }
    }

    let total: u64 = counts.iter().sum();
    if total == 0 {
        return None;
    }

    let mut entries: Vec<CategoryEntry> = names
        .iter()
        .zip(counts.iter())
        .map(|(name, count)| {
            let label = match name {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            CategoryEntry::new(label, round4(*count as f64 / total as f64))
        })
        .collect();

    // 稳定排序：占比相同保持特征原始顺序
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));

    tracing::debug!(
        "树模型 dump 解析: {} 棵树, {} 个特征, {} 个内部节点",
        trees.len(),
        names.len(),
        total
    );
    Some(entries)
}

fn int_array(tree: &Value, key: &str) -> Option<Vec<i64>> {
    tree.get(key)?
        .as_array()?
        .iter()
        .map(Value::as_i64)
        .collect()
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dump(trees: Value) -> Value {
        json!({
            "learner": {
                "feature_names": ["EX1.MELT_TEMP", "EX1.MD_PV"],
                "gradient_booster": { "model": { "trees": trees } }
            }
        })
    }

    #[test]
    fn test_two_features_sum_to_one() {
        let json = dump(json!([{
            "split_indices": [0, 1, 0, 0, 0],
            "left_children": [1, 3, -1, -1, -1],
            "right_children": [2, 4, -1, -1, -1]
        }]));

        let entries = extract_split_frequency(&json).unwrap();
        assert_eq!(entries.len(), 2);
        let sum: f64 = entries.iter().map(|e| e.value).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_leaves_are_not_counted_and_sorted_desc() {
        let json = dump(json!([
            {
                "split_indices": [1, 0, 0],
                "left_children": [1, -1, -1],
                "right_children": [2, -1, -1]
            },
            {
                "split_indices": [1, 1, 0, 0, 0],
                "left_children": [1, 3, -1, -1, -1],
                "right_children": [2, 4, -1, -1, -1]
            }
        ]));

        let entries = extract_split_frequency(&json).unwrap();
        assert_eq!(entries[0].name, "EX1.MD_PV");
        assert_eq!(entries[0].value, 1.0);
        assert_eq!(entries[1].name, "EX1.MELT_TEMP");
        assert_eq!(entries[1].value, 0.0);
    }

    #[test]
    fn test_no_internal_nodes_is_none() {
        let json = dump(json!([{
            "split_indices": [0],
            "left_children": [-1],
            "right_children": [-1]
        }]));
        assert!(looks_like_tree_dump(&json));
        assert!(extract_split_frequency(&json).is_none());
    }

    #[test]
    fn test_out_of_range_feature_index_ignored() {
        let json = dump(json!([{
            "split_indices": [7, 0, 0, 0, 0],
            "left_children": [1, 3, -1, -1, -1],
            "right_children": [2, 4, -1, -1, -1]
        }]));
        let entries = extract_split_frequency(&json).unwrap();
        assert_eq!(entries[0].name, "EX1.MELT_TEMP");
        assert_eq!(entries[0].value, 1.0);
    }

    #[test]
    fn test_not_a_tree_dump() {
        assert!(!looks_like_tree_dump(&json!({"data": []})));
        assert!(extract_split_frequency(&json!([1, 2, 3])).is_none());
    }
}
