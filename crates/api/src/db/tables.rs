//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Provider,
    ProviderUid,
    Username,
    AvatarUrl,
    CreatedAt,
}

#[derive(Iden)]
pub enum Works {
    Table,
    Id,
    Title,
    Category,
    Creator,
    Description,
    PublicationYear,
    OwnerId,
    VoteCount,
    CreatedAt,
}

#[derive(Iden)]
pub enum Votes {
    Table,
    Id,
    UserId,
    WorkId,
    CreatedAt,
}

#[derive(Iden)]
pub enum Sessions {
    Table,
    Id,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
pub enum OauthStates {
    Table,
    State,
    Provider,
    CreatedAt,
    ExpiresAt,
}
