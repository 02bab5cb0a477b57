//! # 配信先解決
//!
//! メッセージのタグ集合からタグ購読インデックスを引き、配信先コンタクト ID を確定する。
//! 複数タグを購読しているコンタクトは 1 回だけ現れる（初出順を維持）。

use itertools::Itertools;
use kawaraban_domain::{contact::ContactId, tag::TagId};
use kawaraban_infra::{InfraError, repository::TagContactIndex};

/// タグ集合から配信先コンタクト ID を解決する
///
/// タグの並び順にインデックスを引き、重複を初出優先で排除する。
/// どのタグにも購読者がいない場合は空の Vec を返す。
pub(super) async fn resolve(
    index: &dyn TagContactIndex,
    tag_ids: &[TagId],
) -> Result<Vec<ContactId>, InfraError> {
    let mut contact_ids = Vec::new();
    for tag_id in tag_ids {
        contact_ids.extend(index.find_contact_ids_by_tag(tag_id).await?);
    }

    Ok(contact_ids.into_iter().unique().collect())
}
