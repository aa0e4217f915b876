pub mod init_dto;
