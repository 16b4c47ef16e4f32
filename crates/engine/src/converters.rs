//! Domain → wire DTO conversions

use plaza_domain::{FurnitureItem, RoomSummary, RoomTemplate, UserProfile};
use plaza_protocol::{FurnitureDto, RoomSummaryDto, RoomTemplateDto, SessionDto};

pub fn furniture_dto(item: FurnitureItem) -> FurnitureDto {
    FurnitureDto {
        id: item.id,
        uid: item.uid,
        name: item.name,
        sprite_path: item.sprite_path,
        tx: item.tx,
        ty: item.ty,
        rotation: item.rotation,
        scale: item.scale,
        interactable: item.interactable,
        color: item.color,
    }
}

pub fn room_summary_dto(room: RoomSummary) -> RoomSummaryDto {
    RoomSummaryDto {
        id: room.id.as_i64(),
        name: room.name,
        is_public: room.is_public,
        player_count: room.player_count,
    }
}

pub fn room_template_dto(template: RoomTemplate) -> RoomTemplateDto {
    RoomTemplateDto {
        id: template.id.as_i64(),
        name: template.name,
        width: template.width,
        height: template.height,
        skew_angle: template.skew_angle,
        texture_path: template.texture_path,
        default_layout: template.default_layout,
        editable: template.editable,
    }
}

/// Roles serialize sorted so identical sessions serialize identically.
pub fn session_dto(profile: UserProfile) -> SessionDto {
    let mut roles: Vec<String> = profile.roles.into_iter().collect();
    roles.sort();
    SessionDto {
        user_id: profile.id.as_i64(),
        username: profile.username,
        roles,
        inventory: profile.inventory,
    }
}
