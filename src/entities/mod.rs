//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod attendance;
pub mod classroom;
pub mod student;
pub mod subject;
pub mod user;

// Re-export specific types to avoid conflicts
pub use attendance::{
    Column as AttendanceColumn, Entity as Attendance, Model as AttendanceModel,
};
pub use classroom::{Column as ClassroomColumn, Entity as Classroom, Model as ClassroomModel};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use subject::{Column as SubjectColumn, Entity as Subject, Model as SubjectModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
