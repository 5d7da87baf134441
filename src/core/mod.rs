/// Attendance marking sessions, resets and cascades
pub mod attendance;
/// Classroom years and their cascading delete
pub mod classroom;
/// Spreadsheet export of a year's attendance matrix
pub mod export;
/// Bulk student import from spreadsheets
pub mod import;
/// Individual student attendance reports
pub mod report;
/// Startup seeding of the admin user and classroom years
pub mod seed;
/// Student roster operations
pub mod student;
/// Subject operations
pub mod subject;
/// Per-year attendance aggregation
pub mod summary;
/// Present/total counters and their formatting
pub mod tally;
/// User accounts, roles and authentication
pub mod user;
