pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_movies;
mod m20250101_000002_create_cinemas;
mod m20250101_000003_create_showtimes;
mod m20250101_000004_create_users;
mod m20250101_000005_create_bookings;
mod m20250101_000006_create_favorites_and_comments;
mod m20250101_000007_create_admin_and_otp;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_movies::Migration),
            Box::new(m20250101_000002_create_cinemas::Migration),
            Box::new(m20250101_000003_create_showtimes::Migration),
            Box::new(m20250101_000004_create_users::Migration),
            Box::new(m20250101_000005_create_bookings::Migration),
            Box::new(m20250101_000006_create_favorites_and_comments::Migration),
            Box::new(m20250101_000007_create_admin_and_otp::Migration),
        ]
    }
}
