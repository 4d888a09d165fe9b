/*
 * Responsibility
 * - ドメインロジック (認証・トークン) の公開インターフェース
 */
pub mod auth;
